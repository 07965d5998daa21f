//! # Report Generator Module
//!
//! Turns a completed [`Query`] into a [`Report`] by invoking the injected
//! vacancy lookup capability. An empty result set is a valid report (the
//! artifact carries an explicit zero-matches marker); only a failing lookup
//! aborts generation, and it does so before anything touches the disk.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::ReportError;
use crate::query::Query;

/// A single vacancy row as rendered into the report artifact
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VacancyRecord {
    /// Job title as published
    pub title: String,
    /// Employer name
    pub employer: String,
    /// Lower salary bound, if published
    pub salary_from: Option<u64>,
    /// Upper salary bound, if published
    pub salary_to: Option<u64>,
    /// Salary currency code, e.g. "RUR"
    pub currency: Option<String>,
    /// Link to the vacancy page
    pub url: String,
    /// Short requirement/duty snippet, HTML already stripped
    pub snippet: String,
}

/// Injected job-lookup capability.
///
/// Implementations may be slow and may fail; the generator maps any failure
/// to [`ReportError::Lookup`]. Returning an empty vector is not a failure.
#[async_trait]
pub trait VacancySearch: Send + Sync {
    async fn search(&self, role: &str, location: &str) -> anyhow::Result<Vec<VacancyRecord>>;
}

/// A shared handle to a searcher is itself a searcher.
#[async_trait]
impl<T: VacancySearch + ?Sized> VacancySearch for std::sync::Arc<T> {
    async fn search(&self, role: &str, location: &str) -> anyhow::Result<Vec<VacancyRecord>> {
        (**self).search(role, location).await
    }
}

/// An immutable report produced for exactly one completed query
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    /// Sortable unique identifier, also the artifact file stem
    pub id: String,
    pub query: Query,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<VacancyRecord>,
}

impl Report {
    pub fn has_matches(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Build the sortable report identifier: millisecond UTC timestamp plus the
/// chat discriminator, so concurrent sessions never collide on a filename.
pub fn report_id(now: DateTime<Utc>, chat_id: i64) -> String {
    format!("{}_{}", now.format("%Y%m%dT%H%M%S%3f"), chat_id)
}

/// Report generator over an injected lookup capability
pub struct ReportGenerator<S: VacancySearch> {
    searcher: S,
}

impl<S: VacancySearch> ReportGenerator<S> {
    pub fn new(searcher: S) -> Self {
        Self { searcher }
    }

    /// Run the lookup for a completed query and assemble a [`Report`].
    ///
    /// The caller guarantees `query.is_complete()`; the chat id only feeds
    /// the report identifier.
    pub async fn generate(
        &self,
        query: Query,
        chat_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Report, ReportError> {
        info!(chat_id, role = %query.role, location = %query.location, "running vacancy lookup");

        let records = self
            .searcher
            .search(&query.role, &query.location)
            .await
            .map_err(|e| {
                warn!(chat_id, error = %e, "vacancy lookup failed");
                ReportError::Lookup(e.to_string())
            })?;

        if records.is_empty() {
            info!(chat_id, "lookup returned no matches");
        } else {
            info!(chat_id, matches = records.len(), "lookup completed");
        }

        Ok(Report {
            id: report_id(now, chat_id),
            query,
            generated_at: now,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSearch(Vec<VacancyRecord>);

    #[async_trait]
    impl VacancySearch for FixedSearch {
        async fn search(&self, _role: &str, _location: &str) -> anyhow::Result<Vec<VacancyRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl VacancySearch for FailingSearch {
        async fn search(&self, _role: &str, _location: &str) -> anyhow::Result<Vec<VacancyRecord>> {
            anyhow::bail!("connection reset")
        }
    }

    fn query() -> Query {
        Query {
            role: "кассир".to_string(),
            location: "Москва".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_with_matches() {
        let generator = ReportGenerator::new(FixedSearch(vec![VacancyRecord {
            title: "Кассир".to_string(),
            employer: "Пятёрочка".to_string(),
            url: "https://hh.ru/vacancy/1".to_string(),
            ..Default::default()
        }]));
        let report = generator.generate(query(), 42, Utc::now()).await.unwrap();
        assert!(report.has_matches());
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.query.role, "кассир");
    }

    #[tokio::test]
    async fn test_generate_empty_results_is_not_an_error() {
        let generator = ReportGenerator::new(FixedSearch(vec![]));
        let report = generator.generate(query(), 42, Utc::now()).await.unwrap();
        assert!(!report.has_matches());
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn test_generate_lookup_failure_propagates() {
        let generator = ReportGenerator::new(FailingSearch);
        let err = generator.generate(query(), 42, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ReportError::Lookup(_)));
    }

    #[test]
    fn test_report_ids_sort_by_creation_order() {
        let t1 = "2024-05-01T10:00:00.100Z".parse().unwrap();
        let t2 = "2024-05-01T10:00:00.250Z".parse().unwrap();
        let a = report_id(t1, 99);
        let b = report_id(t2, 7);
        assert!(a < b);
    }

    #[test]
    fn test_report_id_carries_chat_discriminator() {
        let t = "2024-05-01T10:00:00.100Z".parse().unwrap();
        assert_ne!(report_id(t, 1), report_id(t, 2));
    }
}
