mod blank;
pub(crate) mod errors;
mod keep;

use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use blank::Blank;
use errors::ActionError;
use keep::Keep;

pub(crate) trait ProcessElement {
    fn process<'a>(&self, elem: &'a InMemElement) -> Result<Cow<'a, InMemElement>, ActionError>;
}

/// Specifies the action to perform on DICOM data elements during processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Replace the data element value with the blank value for its VR.
    Blank,

    /// Preserve the original data element value without modification.
    Keep,
}

impl Action {
    pub(crate) fn get_action_struct(&self) -> Box<dyn ProcessElement> {
        match self {
            Action::Blank => Box::new(Blank),
            Action::Keep => Box::new(Keep),
        }
    }
}
