use crate::Anonymizer;
use crate::batch::{anonymize_files, stage_inputs};
use crate::config::RunConfig;
use crate::ledger::{Ledger, LedgerError, read_subject_id};
use crate::relabel::relabel;
use crate::report::{PipelineReport, Stage};
use log::info;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unable to run the {stage} stage: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Runs a complete de-identification with the given configuration.
///
/// 1. The input files are copied into the working directory
/// 2. The ledger is built for the staged files and written to disk
/// 3. The ledger is read back and the staged files are relabeled and renamed, row by row
/// 4. The relabeled files are anonymized into the output directory, in ledger order
///
/// Only the files staged by this run are picked up, whatever else the working directory holds.
///
/// # Errors
///
/// Only problems that leave nothing to continue with are returned as errors, e.g. a directory
/// that cannot be listed or created, or a ledger that cannot be written. Problems with single
/// files end up in the [`PipelineReport`].
pub fn run(config: &RunConfig) -> Result<PipelineReport, PipelineError> {
    let working_dir = config.working_dir();

    let staging = stage_inputs(
        config.input_dir(),
        working_dir,
        config.extension(),
        config.stamp_file_names(),
    )
    .map_err(|source| PipelineError::Stage {
        stage: Stage::Staging,
        source,
    })?;

    let file_names = staging
        .outcomes()
        .iter()
        .map(|outcome| outcome.file_name.clone())
        .collect();
    let ledger_path = config.ledger_path();
    Ledger::assign(file_names, config.prefix(), config.start(), |name| {
        read_subject_id(working_dir.join(name))
    })
    .write_csv(&ledger_path)?;
    let ledger = Ledger::read_csv(&ledger_path)?;
    info!(
        "ledger with {} rows written to {}",
        ledger.len(),
        ledger_path.display()
    );

    let relabel = relabel(working_dir, &ledger);

    let relabeled = relabel
        .outcomes()
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().ok());
    let anonymizer = Anonymizer::default();
    let anonymize = anonymize_files(&anonymizer, relabeled, config.output_dir())
        .map_err(|source| PipelineError::Stage {
            stage: Stage::Anonymize,
            source,
        })?;

    Ok(PipelineReport {
        ledger_path,
        ledger_rows: ledger.len(),
        staging,
        relabel,
        anonymize,
    })
}
