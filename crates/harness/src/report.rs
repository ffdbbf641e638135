//! Report files written after a run.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    error::{HarnessError, Result},
    runner::{RunSummary, TestResult},
};

pub const RESULTS_FILE: &str = "test-results.json";
pub const OUTPUT_FILE: &str = "test-output.txt";
pub const SUMMARY_FILE: &str = "test-summary.txt";

#[derive(Serialize)]
struct ResultsDocument<'a> {
    generated: String,
    #[serde(flatten)]
    summary: RunSummary,
    total: usize,
    results: &'a [TestResult],
}

/// Writes reports into one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Creates `dir` if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .map_err(|source| HarnessError::Report { path: dir.clone(), source })?;
            info!(dir = %dir.display(), "Created reports directory");
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Machine-readable results with counts.
    pub fn write_results(&self, results: &[TestResult]) -> Result<PathBuf> {
        let summary = RunSummary::from_results(results);
        let document = ResultsDocument {
            generated: timestamp(Utc::now()),
            summary,
            total: summary.total(),
            results,
        };
        self.write(RESULTS_FILE, &serde_json::to_string_pretty(&document)?)
    }

    /// One line per test.
    pub fn write_output(&self, results: &[TestResult]) -> Result<PathBuf> {
        let mut out = String::new();
        for result in results {
            let status = if result.skipped {
                "SKIP"
            } else if result.passed {
                "PASS"
            } else {
                "FAIL"
            };
            let _ =
                write!(out, "[{status}] {} ({}ms)", result.qualified_name(), result.duration_ms);
            if let Some(detail) = result.error.as_ref().or(result.skip_reason.as_ref()) {
                let _ = write!(out, ": {detail}");
            }
            out.push('\n');
        }

        let RunSummary { passed, failed, skipped } = RunSummary::from_results(results);
        let _ = writeln!(out, "\n{passed} passed, {failed} failed, {skipped} skipped");
        self.write(OUTPUT_FILE, &out)
    }

    /// Timestamped index of the report files.
    pub fn write_summary(&self) -> Result<PathBuf> {
        self.write(SUMMARY_FILE, &render_summary(Utc::now(), &self.dir))
    }

    /// Writes all three reports and returns their paths.
    pub fn write_all(&self, results: &[TestResult]) -> Result<Vec<PathBuf>> {
        Ok(vec![self.write_results(results)?, self.write_output(results)?, self.write_summary()?])
    }

    fn write(&self, file: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.join(file);
        std::fs::write(&path, contents)
            .map_err(|source| HarnessError::Report { path: path.clone(), source })?;
        Ok(path)
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn render_summary(now: DateTime<Utc>, dir: &Path) -> String {
    let dir = dir.display();
    format!(
        "\nTest Report Summary\n===================\nGenerated: {}\n\nReport Files:\n\
         - JSON Report: {dir}/{RESULTS_FILE}\n\
         - Simple Output: {dir}/{OUTPUT_FILE}\n",
        timestamp(now)
    )
}
