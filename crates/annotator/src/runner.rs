//! Directory-level batch run used by the `annotator` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::configuration::Configuration;
use tokio::task::{self, JoinSet};
use tracing::{error, info, warn};

use crate::batch::{BatchOrchestrator, BatchReport};
use crate::errors::{ExportError, RunError};
use crate::export::{output_paths, write_ndjson, write_sqlite, CsvExporter, OutputPaths};

/// What happened to one input file.
#[derive(Debug)]
pub enum FileOutcome {
    /// `database_written` is false when only the sqlite export failed.
    Written {
        records: usize,
        paths: OutputPaths,
        database_written: bool,
        report: BatchReport,
    },
    Empty {
        report: BatchReport,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub files_seen: usize,
    pub files_written: usize,
    pub files_empty: usize,
    pub files_skipped: usize,
    pub databases_failed: usize,
    pub records: usize,
    pub report: BatchReport,
}

impl RunSummary {
    fn record(&mut self, outcome: FileOutcome) {
        self.files_seen += 1;
        match outcome {
            FileOutcome::Written {
                records,
                database_written,
                report,
                ..
            } => {
                self.files_written += 1;
                if !database_written {
                    self.databases_failed += 1;
                }
                self.records += records;
                self.report.merge(report);
            }
            FileOutcome::Empty { report } => {
                self.files_empty += 1;
                self.report.merge(report);
            }
            FileOutcome::Skipped { .. } => self.files_skipped += 1,
        }
    }
}

/// `*.json` files directly under `dir`, sorted by name.
pub fn discover_inputs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json && path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

fn process_file(orchestrator: &BatchOrchestrator, input: &Path, output_dir: &Path) -> FileOutcome {
    let output = match orchestrator.annotate_file(input) {
        Ok(output) => output,
        Err(e) => {
            error!(file = %input.display(), error = %e, "skipping unreadable input");
            return FileOutcome::Skipped {
                reason: e.to_string(),
            };
        }
    };

    if output.records.is_empty() {
        warn!(file = %input.display(), "no records produced, nothing written");
        return FileOutcome::Empty {
            report: output.report,
        };
    }

    let paths = output_paths(output_dir, input);
    let written: Result<(), ExportError> = CsvExporter::new()
        .write(&output.records, &paths.csv)
        .and_then(|()| write_ndjson(&output.records, &paths.ndjson));
    if let Err(e) = written {
        error!(file = %input.display(), error = %e, "failed to write results");
        return FileOutcome::Skipped {
            reason: e.to_string(),
        };
    }

    let database_written = match write_sqlite(&output.records, &paths.db) {
        Ok(()) => true,
        Err(e) => {
            error!(
                file = %input.display(),
                db = %paths.db.display(),
                error = %e,
                "failed to write database, keeping csv and ndjson"
            );
            false
        }
    };

    info!(
        file = %input.display(),
        records = output.records.len(),
        csv = %paths.csv.display(),
        database_written,
        unanswered = output.report.unanswered,
        slow_responses = output.report.slow_responses,
        failures = output.report.failures.len(),
        "results written"
    );
    FileOutcome::Written {
        records: output.records.len(),
        paths,
        database_written,
        report: output.report,
    }
}

/// Annotates every input file of `settings.data_dir` and writes one result
/// pair per file into `settings.output_dir`.
pub async fn run(config: Configuration) -> Result<RunSummary, RunError> {
    let data_dir = config.settings.data_dir.clone();
    let output_dir = config.settings.output_dir.clone();

    let inputs = match discover_inputs(&data_dir) {
        Ok(inputs) => inputs,
        Err(e) => {
            warn!(dir = %data_dir.display(), error = %e, "cannot read data directory");
            return Ok(RunSummary::default());
        }
    };
    if inputs.is_empty() {
        warn!(dir = %data_dir.display(), "no json files found");
        return Ok(RunSummary::default());
    }
    info!(dir = %data_dir.display(), files = inputs.len(), "starting annotation run");

    fs::create_dir_all(&output_dir).map_err(|source| RunError::Io {
        path: output_dir.clone(),
        source,
    })?;

    // The analyzer may own a blocking http client, which must not be
    // created or dropped on an async worker.
    let orchestrator = Arc::new(
        task::spawn_blocking(move || BatchOrchestrator::from_configuration(&config)).await??,
    );

    let mut join_set = JoinSet::new();
    for (position, input) in inputs.into_iter().enumerate() {
        let orchestrator = orchestrator.clone();
        let output_dir = output_dir.clone();
        join_set.spawn_blocking(move || {
            let outcome = process_file(&orchestrator, &input, &output_dir);
            (position, outcome)
        });
    }

    let mut finished = Vec::with_capacity(join_set.len());
    let mut join_error = None;
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(done) => finished.push(done),
            Err(e) => {
                error!(error = %e, "annotation task failed");
                join_error.get_or_insert(e);
            }
        }
    }

    // Released before any task error is propagated.
    task::spawn_blocking(move || drop(orchestrator)).await?;
    if let Some(e) = join_error {
        return Err(e.into());
    }

    finished.sort_by_key(|(position, _)| *position);
    let mut summary = RunSummary::default();
    for (_, outcome) in finished {
        summary.record(outcome);
    }

    info!(
        files = summary.files_seen,
        written = summary.files_written,
        empty = summary.files_empty,
        skipped = summary.files_skipped,
        databases_failed = summary.databases_failed,
        records = summary.records,
        messages_failed = summary.report.messages_failed,
        message_failure_rate = summary.report.message_failure_rate(),
        conversations_skipped = summary.report.conversations_skipped,
        clean = summary.report.is_clean(),
        "annotation run finished"
    );
    Ok(summary)
}
