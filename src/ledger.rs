//! The ledger maps every input file to the surrogate patient id that replaces its original one.

use crate::config::prefix::IdPrefix;
use crate::files::{list_files, natural_sort, persist_atomically};
use crate::tags;
use dicom_object::OpenFileOptions;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Header row of the ledger CSV.
pub const LEDGER_HEADER: [&str; 3] = ["original_file_name", "original_patient_id", "unique_id"];

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid ledger: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid ledger header: expected {expected:?}, found {found:?}")]
    InvalidHeader {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// A generated replacement patient id, formatted as `<prefix>_<5-digit sequence>`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurrogateId(String);

impl SurrogateId {
    /// ```
    /// use dicom_deidentify::ledger::SurrogateId;
    ///
    /// let prefix = "PFX".parse().unwrap();
    /// assert_eq!(SurrogateId::new(&prefix, 7).as_ref(), "PFX_00007");
    /// ```
    pub fn new(prefix: &IdPrefix, sequence: u64) -> Self {
        Self(format!("{prefix}_{sequence:05}"))
    }
}

impl AsRef<str> for SurrogateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurrogateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The patient id found in a file before relabeling.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum OriginalSubject {
    Known(String),
    /// The file has no Patient ID.
    Unknown,
    /// The file could not be decoded.
    ReadError,
}

impl fmt::Display for OriginalSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginalSubject::Known(id) => f.write_str(id),
            OriginalSubject::Unknown => f.write_str("Unknown"),
            OriginalSubject::ReadError => f.write_str("ReadError"),
        }
    }
}

/// Reads the Patient ID of the DICOM file at `path`, without decoding the pixel data.
pub fn read_subject_id<P: AsRef<Path>>(path: P) -> OriginalSubject {
    let path = path.as_ref();
    let obj = match OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)
    {
        Ok(obj) => obj,
        Err(e) => {
            warn!("unable to read patient id from {}: {e}", path.display());
            return OriginalSubject::ReadError;
        }
    };

    match obj.element(tags::PATIENT_ID).map(|elem| elem.to_str()) {
        Ok(Ok(id)) => OriginalSubject::Known(id.trim_end_matches(['\0', ' ']).to_owned()),
        Ok(Err(e)) => {
            warn!("unable to read patient id from {}: {e}", path.display());
            OriginalSubject::ReadError
        }
        Err(_) => OriginalSubject::Unknown,
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub original_file_name: String,
    #[serde(rename = "original_patient_id")]
    pub original_subject_id: String,
    #[serde(rename = "unique_id")]
    pub surrogate_id: SurrogateId,
}

/// The rows of a ledger, in the order the files are processed.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    /// Assigns surrogate ids to `file_names`.
    ///
    /// The names are put in natural-sort order and numbered from `start` onwards. `lookup` gives
    /// the original patient id of a file name.
    pub fn assign<F>(
        mut file_names: Vec<String>,
        prefix: &IdPrefix,
        start: u32,
        mut lookup: F,
    ) -> Self
    where
        F: FnMut(&str) -> OriginalSubject,
    {
        natural_sort(&mut file_names);

        let rows = file_names
            .into_iter()
            .zip(u64::from(start)..)
            .map(|(name, sequence)| LedgerRow {
                original_subject_id: lookup(&name).to_string(),
                surrogate_id: SurrogateId::new(prefix, sequence),
                original_file_name: name,
            })
            .collect();

        Self { rows }
    }

    /// Builds the ledger for the files in `dir` with the given extension.
    ///
    /// A file that cannot be decoded still gets a row, with `ReadError` as its original id.
    pub fn from_dir<P: AsRef<Path>>(
        dir: P,
        extension: &str,
        prefix: &IdPrefix,
        start: u32,
    ) -> Result<Self, LedgerError> {
        let dir = dir.as_ref();
        let file_names = list_files(dir, extension)?;
        Ok(Self::assign(file_names, prefix, start, |name| {
            read_subject_id(dir.join(name))
        }))
    }

    /// Writes the ledger as CSV, replacing any existing file at `path`.
    ///
    /// The header row is written even when the ledger has no rows.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), LedgerError> {
        persist_atomically(path.as_ref(), |file| self.to_writer(file))
    }

    /// Reads a ledger back from CSV. The header row must match [`LEDGER_HEADER`].
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let mut reader = csv::Reader::from_path(path)?;

        let found: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if found != LEDGER_HEADER {
            return Err(LedgerError::InvalidHeader {
                expected: LEDGER_HEADER.iter().map(|s| s.to_string()).collect(),
                found,
            });
        }

        let rows = reader
            .deserialize()
            .collect::<Result<Vec<LedgerRow>, _>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the ledger as CSV to an arbitrary writer, e.g. stdout.
    pub fn to_writer<W: Write>(&self, to: W) -> Result<(), LedgerError> {
        // the header is written by hand, serialize() skips it when there are no rows
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(to);
        writer.write_record(LEDGER_HEADER)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
