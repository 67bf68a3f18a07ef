use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use crate::actions::ProcessElement;
use crate::actions::errors::ActionError;

/// Action that preserves DICOM element values unchanged.
///
/// Applied to every tag on the allow-list. The element is handed back as-is, value and VR included.
#[derive(Debug, Clone, PartialEq)]
pub struct Keep;

impl ProcessElement for Keep {
    fn process<'a>(&self, elem: &'a InMemElement) -> Result<Cow<'a, InMemElement>, ActionError> {
        Ok(Cow::Borrowed(elem))
    }
}
