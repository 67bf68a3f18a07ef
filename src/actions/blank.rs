use dicom_core::header::Header;
use dicom_object::mem::InMemElement;
use std::borrow::Cow;

use crate::actions::ProcessElement;
use crate::actions::errors::ActionError;
use crate::vr;

/// Action that blanks the value of a DICOM element.
///
/// The element stays in the data set with its tag and VR intact. Only the value is replaced,
/// using the blank value for the element's VR (see [`vr::blank_value`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Blank;

impl ProcessElement for Blank {
    fn process<'a>(&self, elem: &'a InMemElement) -> Result<Cow<'a, InMemElement>, ActionError> {
        let new_elem = InMemElement::new(elem.tag(), elem.vr(), vr::blank_value(elem.vr()));
        Ok(Cow::Owned(new_elem))
    }
}
