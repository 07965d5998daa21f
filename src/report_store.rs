//! # Report Store Module
//!
//! Persists report artifacts under the configured directory. Filenames are
//! the report's sortable identifier, so a directory listing reads in
//! creation order. Writes go through a temporary file in the same directory
//! and are persisted with a rename, so a crash or a full disk never leaves
//! a half-written report at the final path.

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::errors::ReportError;
use crate::report::{Report, VacancyRecord};

/// Marker line written instead of rows when the lookup matched nothing
pub const NO_MATCHES_MARKER: &str = "Совпадений не найдено (0 вакансий)";

/// File-system store for report artifacts
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the report to `<dir>/<id>.txt` and return the final path.
    ///
    /// The directory is created on first use. Either the full content lands
    /// at the final path or nothing is written and a
    /// [`ReportError::Storage`] is returned.
    pub fn save(&self, report: &Report) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.dir)?;

        let final_path = self.dir.join(format!("{}.txt", report.id));
        let content = render_report(report);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&final_path)
            .map_err(|e| ReportError::Storage(e.to_string()))?;

        log::info!(
            "report {} saved to {} ({} rows)",
            report.id,
            final_path.display(),
            report.records.len()
        );
        Ok(final_path)
    }
}

/// Render the report artifact as plain text
fn render_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Отчёт по вакансиям");
    let _ = writeln!(out, "Запрос: {}; {}", report.query.role, report.query.location);
    let _ = writeln!(
        out,
        "Сформирован: {} UTC",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out);

    if report.records.is_empty() {
        let _ = writeln!(out, "{NO_MATCHES_MARKER}");
        return out;
    }

    let _ = writeln!(out, "Найдено вакансий: {}", report.records.len());
    for (i, record) in report.records.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {} — {}", i + 1, record.title, record.employer);
        if let Some(salary) = format_salary(record) {
            let _ = writeln!(out, "   Зарплата: {salary}");
        }
        if !record.snippet.is_empty() {
            let _ = writeln!(out, "   {}", record.snippet);
        }
        let _ = writeln!(out, "   {}", record.url);
    }
    out
}

fn format_salary(record: &VacancyRecord) -> Option<String> {
    let currency = record.currency.as_deref().unwrap_or("RUR");
    match (record.salary_from, record.salary_to) {
        (Some(from), Some(to)) => Some(format!("{from}–{to} {currency}")),
        (Some(from), None) => Some(format!("от {from} {currency}")),
        (None, Some(to)) => Some(format!("до {to} {currency}")),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use crate::report::report_id;
    use chrono::Utc;

    fn report(records: Vec<VacancyRecord>) -> Report {
        let now = Utc::now();
        Report {
            id: report_id(now, 42),
            query: Query {
                role: "кассир".to_string(),
                location: "Москва".to_string(),
            },
            generated_at: now,
            records,
        }
    }

    #[test]
    fn test_save_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path().join("reports"));
        let path = store.save(&report(vec![])).unwrap();
        assert!(path.exists());
        assert!(path.starts_with(tmp.path().join("reports")));
    }

    #[test]
    fn test_saved_report_contains_query_and_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let path = store
            .save(&report(vec![VacancyRecord {
                title: "Кассир".to_string(),
                employer: "Пятёрочка".to_string(),
                salary_from: Some(45000),
                salary_to: Some(60000),
                currency: Some("RUR".to_string()),
                url: "https://hh.ru/vacancy/1".to_string(),
                snippet: "График 2/2".to_string(),
            }]))
            .unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("кассир; Москва"));
        assert!(content.contains("Кассир — Пятёрочка"));
        assert!(content.contains("45000–60000 RUR"));
        assert!(content.contains("https://hh.ru/vacancy/1"));
        assert!(!content.contains(NO_MATCHES_MARKER));
    }

    #[test]
    fn test_zero_results_report_has_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let path = store.save(&report(vec![])).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains(NO_MATCHES_MARKER));
        assert!(content.contains("кассир; Москва"));
    }

    #[test]
    fn test_save_fails_without_partial_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        // A file where the report directory should be makes create_dir_all fail
        let blocked = tmp.path().join("reports");
        fs::write(&blocked, b"not a directory").unwrap();

        let store = ReportStore::new(&blocked);
        let err = store.save(&report(vec![])).unwrap_err();
        assert!(matches!(err, ReportError::Storage(_)));
        assert!(blocked.is_file());
    }

    #[test]
    fn test_filenames_sort_in_creation_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReportStore::new(tmp.path());
        let t1 = "2024-05-01T10:00:00.100Z".parse().unwrap();
        let t2 = "2024-05-01T10:00:01.000Z".parse().unwrap();
        let mut first = report(vec![]);
        first.id = report_id(t1, 2);
        let mut second = report(vec![]);
        second.id = report_id(t2, 1);
        store.save(&first).unwrap();
        store.save(&second).unwrap();

        let mut names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert!(names[0].contains("100_2"));
        assert!(names[1].contains("000_1"));
    }
}
