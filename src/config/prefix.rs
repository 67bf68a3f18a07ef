use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

static ID_PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();
const ID_PREFIX_MAX_LENGTH: usize = 32;
pub const ID_PREFIX_DEFAULT_VALUE: &str = "ANON";

/// The [`IdPrefix`] struct represents the fixed prefix of every surrogate patient id.
///
/// Surrogate ids are formed as `<prefix>_<sequence>` and replace the Patient ID (VR `LO`), so
/// the [`IdPrefix`] must:
/// - Start with a letter or digit
/// - Contain only letters, digits, `_`, `.` and `-`
///
/// It also must not have more than 32 characters.
///
/// # Example
///
/// ```
/// use dicom_deidentify::config::prefix::IdPrefix;
///
/// // Create a valid prefix
/// let prefix = "NIRT_DS01".parse::<IdPrefix>().unwrap();
///
/// // Invalid prefix (contains a backslash, the DICOM value delimiter)
/// let invalid = "AB\\CD".parse::<IdPrefix>();
/// assert!(invalid.is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[serde(try_from = "String", into = "String")]
pub struct IdPrefix(String);

#[derive(Error, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[error("{0} is not a valid id prefix")]
pub struct IdPrefixError(pub String);

impl IdPrefix {
    pub fn new(prefix: &str) -> Result<Self, IdPrefixError> {
        let regex = ID_PREFIX_REGEX.get_or_init(|| {
            Regex::new(&format!(
                r"^[A-Za-z0-9][A-Za-z0-9_.-]{{0,{}}}$",
                ID_PREFIX_MAX_LENGTH - 1
            ))
            .unwrap()
        });

        if !regex.is_match(prefix) {
            return Err(IdPrefixError(format!(
                "id prefix must start with a letter or digit, contain only letters, digits, '_', '.' and '-', and be no longer than {ID_PREFIX_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(prefix.into()))
    }
}

impl Default for IdPrefix {
    fn default() -> Self {
        Self(ID_PREFIX_DEFAULT_VALUE.into())
    }
}

impl FromStr for IdPrefix {
    type Err = IdPrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdPrefix::new(s)
    }
}

impl TryFrom<String> for IdPrefix {
    type Error = IdPrefixError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        IdPrefix::new(&value)
    }
}

impl From<IdPrefix> for String {
    fn from(prefix: IdPrefix) -> Self {
        prefix.0
    }
}

impl AsRef<str> for IdPrefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefix_validation() {
        // Valid cases
        assert!(IdPrefix::new("PFX").is_ok());
        assert!(IdPrefix::new("NIRT_DS01").is_ok());
        assert!(IdPrefix::new("site-3.study").is_ok());
        assert!(IdPrefix::new("7").is_ok());
        assert!(IdPrefix::new(&"A".repeat(32)).is_ok());

        // Invalid cases
        assert!(IdPrefix::new("").is_err()); // empty
        assert!(IdPrefix::new("_PFX").is_err()); // starts with underscore
        assert!(IdPrefix::new("PF X").is_err()); // contains a space
        assert!(IdPrefix::new("PF\\X").is_err()); // contains a value delimiter
        assert!(IdPrefix::new(&"A".repeat(33)).is_err()); // too long
    }

    #[test]
    fn test_id_prefix_default() {
        assert_eq!(IdPrefix::default().as_ref(), "ANON");
    }

    #[test]
    fn test_id_prefix_from_str() {
        let prefix: Result<IdPrefix, _> = "PFX".parse();
        assert_eq!(prefix.unwrap().to_string(), "PFX");

        let prefix: Result<IdPrefix, _> = "P/X".parse();
        assert!(prefix.is_err());
    }

    #[test]
    fn test_id_prefix_serde() {
        let prefix: IdPrefix = serde_json::from_str(r#""NIRT_DS01""#).unwrap();
        assert_eq!(prefix.as_ref(), "NIRT_DS01");
        assert_eq!(serde_json::to_string(&prefix).unwrap(), r#""NIRT_DS01""#);

        let invalid = serde_json::from_str::<IdPrefix>(r#""bad prefix""#);
        assert!(invalid.is_err());
    }
}
