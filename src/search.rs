//! # Vacancy Lookup Client Module
//!
//! Production implementation of [`VacancySearch`] over the hh.ru public API.
//! The city is resolved to an hh.ru area id through the suggest endpoint;
//! vacancy pages are then fetched with retry and a short jittered pause
//! between pages so the API is not hammered.
//!
//! This client lives outside the dialogue core: the core only sees the
//! [`VacancySearch`] trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::report::{VacancyRecord, VacancySearch};

lazy_static! {
    /// hh.ru wraps matched words in <highlighttext> tags inside snippets
    static ref HTML_TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Strip markup and collapse whitespace in a snippet fragment
fn strip_html(raw: &str) -> String {
    let without_tags = HTML_TAG_RE.replace_all(raw, " ");
    WHITESPACE_RE.replace_all(&without_tags, " ").trim().to_string()
}

#[derive(Debug, Deserialize)]
struct AreaSuggests {
    items: Vec<AreaSuggest>,
}

#[derive(Debug, Deserialize)]
struct AreaSuggest {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct VacanciesPage {
    items: Vec<HhVacancy>,
    pages: u32,
}

#[derive(Debug, Deserialize)]
struct HhVacancy {
    name: String,
    alternate_url: String,
    employer: Option<HhEmployer>,
    salary: Option<HhSalary>,
    snippet: Option<HhSnippet>,
}

#[derive(Debug, Deserialize)]
struct HhEmployer {
    name: String,
}

#[derive(Debug, Deserialize)]
struct HhSalary {
    from: Option<u64>,
    to: Option<u64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HhSnippet {
    requirement: Option<String>,
    responsibility: Option<String>,
}

impl HhVacancy {
    fn into_record(self) -> VacancyRecord {
        let snippet = self
            .snippet
            .map(|s| {
                let parts: Vec<String> = [s.requirement, s.responsibility]
                    .into_iter()
                    .flatten()
                    .map(|p| strip_html(&p))
                    .filter(|p| !p.is_empty())
                    .collect();
                parts.join(" ")
            })
            .unwrap_or_default();

        VacancyRecord {
            title: self.name,
            employer: self.employer.map(|e| e.name).unwrap_or_default(),
            salary_from: self.salary.as_ref().and_then(|s| s.from),
            salary_to: self.salary.as_ref().and_then(|s| s.to),
            currency: self.salary.and_then(|s| s.currency),
            url: self.alternate_url,
            snippet,
        }
    }
}

/// hh.ru-backed vacancy lookup
pub struct HhClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl HhClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    /// GET with retry and exponential backoff plus random jitter
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.base_retry_delay_ms * (1u64 << (attempt - 1));
                let jitter = rand::thread_rng().gen_range(0..250u64);
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
            }
            match self.try_get_json(url, params).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(url, attempt, error = %e, "hh.ru request failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("request failed")))
    }

    async fn try_get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self.http.get(url).query(params).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Resolve a city name to an hh.ru area id via the suggest endpoint.
    ///
    /// Returns `None` when nothing matches; the caller then falls back to a
    /// plain-text search with the city appended to the query.
    async fn resolve_area(&self, location: &str) -> Result<Option<String>> {
        let url = format!("{}/suggests/areas", self.config.base_url);
        let suggests: AreaSuggests = self
            .get_json(&url, &[("text", location.to_string())])
            .await
            .context("area suggest request failed")?;

        match suggests.items.into_iter().next() {
            Some(area) => {
                debug!(location, area_id = %area.id, area_name = %area.text, "resolved area");
                Ok(Some(area.id))
            }
            None => {
                debug!(location, "no area match, falling back to text search");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl VacancySearch for HhClient {
    async fn search(&self, role: &str, location: &str) -> Result<Vec<VacancyRecord>> {
        let area = self.resolve_area(location).await?;
        let text = match &area {
            Some(_) => role.to_string(),
            None => format!("{role} {location}"),
        };

        let url = format!("{}/vacancies", self.config.base_url);
        let mut records = Vec::new();

        for page in 0..self.config.pages {
            let mut params = vec![
                ("text", text.clone()),
                ("page", page.to_string()),
                ("per_page", self.config.per_page.to_string()),
            ];
            if let Some(area_id) = &area {
                params.push(("area", area_id.clone()));
            }

            let body: VacanciesPage = self
                .get_json(&url, &params)
                .await
                .with_context(|| format!("vacancies request failed on page {page}"))?;

            let total_pages = body.pages;
            records.extend(body.items.into_iter().map(HhVacancy::into_record));

            if page + 1 >= total_pages {
                break;
            }
            tokio::time::sleep(Duration::from_millis(self.config.page_pause_ms)).await;
        }

        debug!(role, location, count = records.len(), "hh.ru search finished");
        Ok(records)
    }
}
