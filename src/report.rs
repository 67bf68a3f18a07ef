use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single file could not be processed. The file is skipped and the run goes on.
#[derive(Error, Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FileError {
    #[error("unable to decode: {0}")]
    Decode(String),

    #[error("file not found: {0}")]
    MissingFile(String),

    #[error("unable to encode: {0}")]
    Encode(String),

    #[error("unable to process: {0}")]
    Transform(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        FileError::Io(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Staging,
    Relabel,
    Anonymize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Staging => "staging",
            Stage::Relabel => "relabel",
            Stage::Anonymize => "anonymize",
        };
        f.write_str(name)
    }
}

/// The result for one file of a stage: the path it was written to, or why it was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub result: Result<PathBuf, FileError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    stage: Stage,
    outcomes: Vec<FileOutcome>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            outcomes: Vec::new(),
        }
    }

    /// Adds the outcome for `file_name` and logs a status line for it.
    pub fn record(&mut self, file_name: &str, result: Result<PathBuf, FileError>) {
        match &result {
            Ok(path) => info!("{}: {file_name} -> {}", self.stage, path.display()),
            Err(e) => warn!("{}: skipping {file_name}: {e}", self.stage),
        }
        self.outcomes.push(FileOutcome {
            file_name: file_name.to_owned(),
            result,
        });
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Everything a pipeline run did, stage by stage.
///
/// Its [`Display`](fmt::Display) implementation gives the one line summary of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub ledger_path: PathBuf,
    pub ledger_rows: usize,
    pub staging: StageReport,
    pub relabel: StageReport,
    pub anonymize: StageReport,
}

impl PipelineReport {
    pub fn stages(&self) -> [&StageReport; 3] {
        [&self.staging, &self.relabel, &self.anonymize]
    }

    /// Number of files that were skipped by any of the stages.
    pub fn failed(&self) -> usize {
        self.stages().iter().map(|stage| stage.failed()).sum()
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} files anonymized ({} staging, {} relabel, {} anonymize failures), ledger with {} rows written to {}",
            self.anonymize.succeeded(),
            self.staging.outcomes().len(),
            self.staging.failed(),
            self.relabel.failed(),
            self.anonymize.failed(),
            self.ledger_rows,
            self.ledger_path.display()
        )
    }
}
