pub mod allow_list;
pub mod builder;
pub mod prefix;

use garde::Validate;
use prefix::{IdPrefix, IdPrefixError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LEDGER_FILE_NAME: &str = "patient_ids.csv";
pub const DEFAULT_EXTENSION: &str = "dcm";
pub const DEFAULT_SEQUENCE_START: u32 = 1;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ConfigError {
    #[error("invalid id prefix: {0}")]
    InvalidIdPrefix(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unable to read configuration: {0}")]
    Io(String),

    #[error("unable to parse configuration: {0}")]
    Parse(String),
}

impl From<IdPrefixError> for ConfigError {
    fn from(err: IdPrefixError) -> Self {
        ConfigError::InvalidIdPrefix(err.0)
    }
}

impl From<garde::Report> for ConfigError {
    fn from(report: garde::Report) -> Self {
        ConfigError::Invalid(report.to_string().trim().to_owned())
    }
}

fn default_start() -> u32 {
    DEFAULT_SEQUENCE_START
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.into()
}

fn non_empty_path(value: &PathBuf, _ctx: &()) -> garde::Result {
    if value.as_os_str().is_empty() {
        return Err(garde::Error::new("path must not be empty"));
    }
    Ok(())
}

fn distinct_from<'a>(
    other: &'a Path,
    other_name: &'static str,
) -> impl FnOnce(&PathBuf, &()) -> garde::Result + 'a {
    move |value, _| {
        if value.as_path() == other {
            return Err(garde::Error::new(format!(
                "must be a different directory than the {other_name} directory"
            )));
        }
        Ok(())
    }
}

/// Configuration for a single de-identification run.
///
/// A run stages the files of `input_dir` into `working_dir`, assigns surrogate ids and records them
/// in the ledger, relabels and renames the staged files, and finally writes the sanitized files to
/// `output_dir`. The input directory is only ever read. Directories are created when absent but
/// never removed, so cleaning up between runs is up to the caller.
///
/// # Fields
///
/// * `input_dir` - Flat directory with the original DICOM files
/// * `working_dir` - Directory holding the staged, relabeled files
/// * `output_dir` - Directory receiving the sanitized files
/// * `ledger_path` - Location of the ledger CSV (default: `patient_ids.csv` next to `working_dir`)
/// * `prefix` - The [`IdPrefix`] of every surrogate id
/// * `start` - First sequence number handed out (default: `1`)
/// * `extension` - File extension of the files to process, matched case-insensitively (default: `dcm`)
/// * `stamp_file_names` - Set the Patient ID of each staged file to its file name stem before
///   building the ledger
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct RunConfig {
    #[garde(custom(non_empty_path))]
    input_dir: PathBuf,

    #[garde(custom(non_empty_path), custom(distinct_from(&self.input_dir, "input")))]
    working_dir: PathBuf,

    #[garde(
        custom(non_empty_path),
        custom(distinct_from(&self.input_dir, "input")),
        custom(distinct_from(&self.working_dir, "working"))
    )]
    output_dir: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    ledger_path: Option<PathBuf>,

    #[serde(default)]
    #[garde(skip)]
    prefix: IdPrefix,

    #[serde(default = "default_start")]
    #[garde(range(max = 99_999))]
    start: u32,

    #[serde(default = "default_extension")]
    #[garde(length(min = 1, max = 16), alphanumeric)]
    extension: String,

    #[serde(default)]
    #[garde(skip)]
    stamp_file_names: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            working_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            ledger_path: None,
            prefix: IdPrefix::default(),
            start: DEFAULT_SEQUENCE_START,
            extension: DEFAULT_EXTENSION.into(),
            stamp_file_names: false,
        }
    }
}

impl RunConfig {
    /// Loads a [`RunConfig`] from a JSON file and validates it.
    ///
    /// Only the three directories are required, every other field falls back to its default.
    ///
    /// ```json
    /// {
    ///   "input_dir": "/data/set2",
    ///   "working_dir": "/data/set2_anon/updated_dcm_files",
    ///   "output_dir": "/data/set2_anon/anon_dcm_files",
    ///   "prefix": "NIRT_DS01"
    /// }
    /// ```
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the ledger location, which defaults to [`LEDGER_FILE_NAME`] next to the working
    /// directory.
    pub fn ledger_path(&self) -> PathBuf {
        match &self.ledger_path {
            Some(path) => path.clone(),
            None => self.working_dir.with_file_name(LEDGER_FILE_NAME),
        }
    }

    pub fn prefix(&self) -> &IdPrefix {
        &self.prefix
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn stamp_file_names(&self) -> bool {
        self.stamp_file_names
    }
}
