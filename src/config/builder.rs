use crate::config::prefix::IdPrefix;
use crate::config::{ConfigError, RunConfig};
use garde::Validate;
use std::path::PathBuf;

/// A builder for [`RunConfig`].
///
/// # Example
///
/// ```
/// use dicom_deidentify::config::builder::RunConfigBuilder;
///
/// let config = RunConfigBuilder::new()
///     .input_dir("/data/set2")
///     .working_dir("/data/set2_anon/updated_dcm_files")
///     .output_dir("/data/set2_anon/anon_dcm_files")
///     .prefix("NIRT_DS01".parse().unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(config.prefix().as_ref(), "NIRT_DS01");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunConfigBuilder(RunConfig);

impl RunConfigBuilder {
    pub fn new() -> Self {
        RunConfigBuilder(RunConfig::default())
    }

    /// Starts from an existing [`RunConfig`], e.g. one loaded from a file, so individual settings
    /// can be overridden before building.
    pub fn from_config(config: &RunConfig) -> Self {
        RunConfigBuilder(config.clone())
    }

    pub fn input_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.0.input_dir = path.into();
        self
    }

    pub fn working_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.0.working_dir = path.into();
        self
    }

    pub fn output_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.0.output_dir = path.into();
        self
    }

    /// Sets the location of the ledger CSV.
    ///
    /// When not set, the ledger is written as `patient_ids.csv` next to the working directory.
    pub fn ledger_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.0.ledger_path = Some(path.into());
        self
    }

    pub fn prefix(mut self, prefix: IdPrefix) -> Self {
        self.0.prefix = prefix;
        self
    }

    /// Sets the first sequence number handed out. Must be at most `99999`.
    pub fn start(mut self, start: u32) -> Self {
        self.0.start = start;
        self
    }

    /// Sets the extension of the files to process, without the leading dot.
    pub fn extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.0.extension = extension.into();
        self
    }

    pub fn stamp_file_names(mut self, stamp: bool) -> Self {
        self.0.stamp_file_names = stamp;
        self
    }

    /// Validates the settings and returns the [`RunConfig`].
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        self.0.validate()?;
        Ok(self.0)
    }
}
