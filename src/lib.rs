//! Batch de-identification of DICOM files.
//!
//! A run assigns every file of a flat input directory a surrogate patient id, records the mapping
//! in a CSV ledger, relabels and renames the files accordingly, and writes de-identified copies in
//! which only a fixed allow-list of technical attributes survives. All other attributes keep their
//! tag and VR but get a blank value.
//!
//! # Example
//!
//! ```no_run
//! use dicom_deidentify::Anonymizer;
//! use std::fs::File;
//!
//! let anonymizer = Anonymizer::default();
//! let file = File::open("tests/data/test.dcm").unwrap();
//! let result = anonymizer.anonymize(file).unwrap();
//!
//! let mut output = Vec::<u8>::new();
//! result.write(&mut output).unwrap();
//! ```

pub mod actions;
pub mod batch;
pub mod config;
pub mod files;
pub mod ledger;
pub mod pipeline;
pub mod processor;
pub mod relabel;
pub mod report;
pub mod vr;

pub use dicom_core::Tag;
pub use dicom_dictionary_std::tags;

use dicom_object::file::ReadPreamble;
use dicom_object::{DefaultDicomObject, OpenFileOptions, ReadError, WriteError};
use processor::{DefaultProcessor, Processor};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnonymizationError {
    #[error("Read error: {}", .0.to_lowercase())]
    ReadError(String),

    #[error("Write error: {}", .0.to_lowercase())]
    WriteError(String),

    #[error("{}", .0)]
    ProcessingError(String),
}

impl From<ReadError> for AnonymizationError {
    fn from(err: ReadError) -> Self {
        AnonymizationError::ReadError(format!("{err}"))
    }
}

impl From<WriteError> for AnonymizationError {
    fn from(err: WriteError) -> Self {
        AnonymizationError::WriteError(format!("{err}"))
    }
}

impl From<processor::Error> for AnonymizationError {
    fn from(err: processor::Error) -> Self {
        AnonymizationError::ProcessingError(format!("{err}"))
    }
}

pub type Result<T, E = AnonymizationError> = std::result::Result<T, E>;

/// The original DICOM object next to its anonymized counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymizationResult {
    pub original: DefaultDicomObject,
    pub anonymized: DefaultDicomObject,
}

impl AnonymizationResult {
    /// Writes the anonymized object as a complete DICOM file, including preamble and meta group.
    pub fn write<W: Write>(&self, to: W) -> Result<()> {
        self.anonymized.write_all(to)?;
        Ok(())
    }
}

/// Applies a [`Processor`] to whole DICOM files.
///
/// [`Anonymizer::default()`] uses a [`DefaultProcessor`] with the fixed allow-list.
pub struct Anonymizer {
    processor: Box<dyn Processor + Send + Sync>,
}

impl Anonymizer {
    pub fn new<T>(processor: T) -> Self
    where
        T: Processor + Send + Sync + 'static,
    {
        Self {
            processor: Box::new(processor),
        }
    }

    /// Decodes a DICOM file from `src` and anonymizes it.
    ///
    /// The source may or may not start with the 128 byte preamble.
    ///
    /// # Errors
    ///
    /// Returns [`AnonymizationError::ReadError`] when `src` cannot be decoded as a DICOM file, and
    /// [`AnonymizationError::ProcessingError`] when the object cannot be anonymized.
    pub fn anonymize(&self, src: impl Read) -> Result<AnonymizationResult> {
        let obj = OpenFileOptions::new()
            .read_preamble(ReadPreamble::Auto)
            .from_reader(src)?;
        let anonymized = self.anonymize_object(&obj)?;

        Ok(AnonymizationResult {
            original: obj,
            anonymized,
        })
    }

    /// Anonymizes an already decoded DICOM object. The original is left untouched.
    pub fn anonymize_object(&self, obj: &DefaultDicomObject) -> Result<DefaultDicomObject> {
        Ok(self.processor.process_object(obj)?)
    }
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new(DefaultProcessor::default())
    }
}
