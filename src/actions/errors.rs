use dicom_core::value::ConvertValueError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ActionError {
    #[error("Invalid value: {}", .0.to_lowercase())]
    InvalidValue(String),

    #[error("Invalid file meta group: {}", .0.to_lowercase())]
    InvalidHeader(String),
}

impl From<ConvertValueError> for ActionError {
    fn from(err: ConvertValueError) -> Self {
        ActionError::InvalidValue(format!("{err}"))
    }
}
