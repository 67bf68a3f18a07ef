use crate::actions::errors::ActionError;
use crate::config::allow_list::AllowList;
use crate::tags;
use dicom_core::header::Header;
use dicom_core::value::{C, DataSetSequence, PrimitiveValue, Value};
use dicom_core::{Length, Tag, VR};
use dicom_object::mem::{InMemDicomObject, InMemElement};
use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::{DefaultDicomObject, FileMetaTable};
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Value error: {}", .0.to_lowercase())]
    ValueError(String),

    #[error("Header error: {}", .0.to_lowercase())]
    HeaderError(String),
}

impl From<ActionError> for Error {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::InvalidValue(msg) => Error::ValueError(msg),
            ActionError::InvalidHeader(msg) => Error::HeaderError(msg),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub trait Processor {
    /// Processes a single data element, descending into sequence items where applicable.
    fn process_element<'a>(&'a self, elem: &'a InMemElement) -> Result<Cow<'a, InMemElement>>;

    /// Processes every data element of a data set, in order.
    fn process_dataset(&self, obj: &InMemDicomObject) -> Result<InMemDicomObject> {
        let mut processed = InMemDicomObject::new_empty();
        for elem in obj.iter() {
            processed.put(self.process_element(elem)?.into_owned());
        }
        Ok(processed)
    }

    /// Processes the file meta group of a DICOM file.
    ///
    /// Each meta field present in the table is presented as a regular data element and goes
    /// through [`Processor::process_element`]. The group length is always recomputed, and a
    /// version that is no longer two bytes long falls back to the default `00\01`.
    fn process_meta(&self, meta: &FileMetaTable) -> Result<FileMetaTable> {
        let mut processed = Vec::new();
        for elem in meta_elements(meta) {
            processed.push(self.process_element(&elem)?.into_owned());
        }
        Ok(meta_from_elements(&processed)?)
    }

    /// Processes a complete DICOM file: first the main data set, then the file meta group.
    fn process_object(&self, obj: &DefaultDicomObject) -> Result<DefaultDicomObject> {
        let dataset = self.process_dataset(obj)?;
        let meta = self.process_meta(obj.meta())?;

        let mut processed = DefaultDicomObject::new_empty_with_meta(meta);
        for elem in dataset {
            processed.put(elem);
        }
        Ok(processed)
    }
}

/// A processor that keeps the data elements on the [`AllowList`] and blanks all others
///
/// Every data element reachable from the data set is visited, including the ones nested inside
/// sequence items at any depth. A sequence that is not allow-listed is blanked to an empty
/// sequence. A sequence that is allow-listed keeps its items, whose own data elements are
/// processed recursively by the same rules.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultProcessor {
    allow_list: AllowList,
}

impl DefaultProcessor {
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    fn process_items<'a>(&self, elem: Cow<'a, InMemElement>) -> Result<Cow<'a, InMemElement>> {
        let items = match elem.value() {
            Value::Sequence(seq) if !seq.items().is_empty() => seq.items(),
            _ => return Ok(elem),
        };

        let mut processed_items = Vec::with_capacity(items.len());
        for item in items {
            processed_items.push(self.process_dataset(item)?);
        }

        let new_elem = InMemElement::new(
            elem.tag(),
            elem.vr(),
            Value::Sequence(DataSetSequence::new(processed_items, Length::UNDEFINED)),
        );
        Ok(Cow::Owned(new_elem))
    }
}

impl Default for DefaultProcessor {
    fn default() -> Self {
        Self::new(AllowList::default())
    }
}

impl Processor for DefaultProcessor {
    /// Process a DICOM data element according to the allow-list
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing:
    /// * `Cow::Borrowed` - The untouched element, for allow-listed tags without nested sequences
    /// * `Cow::Owned` - The blanked element, or an allow-listed sequence with processed items
    /// * `Err` - If there was an error processing the element
    fn process_element<'a>(&'a self, elem: &'a InMemElement) -> Result<Cow<'a, InMemElement>> {
        let action = self.allow_list.get_action(&elem.tag());
        let processed = action.get_action_struct().process(elem)?;
        self.process_items(processed)
    }
}

/// A processor that leaves every data element unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoopProcessor;

impl NoopProcessor {
    pub fn new() -> Self {
        Self {}
    }
}

impl Processor for NoopProcessor {
    fn process_element<'a>(&'a self, elem: &'a InMemElement) -> Result<Cow<'a, InMemElement>> {
        // just return it as is, without any changes
        Ok(Cow::Borrowed(elem))
    }
}

fn str_element(tag: Tag, vr: VR, value: &str) -> InMemElement {
    InMemElement::new(tag, vr, PrimitiveValue::from(value))
}

fn bytes_element(tag: Tag, bytes: &[u8]) -> InMemElement {
    InMemElement::new(tag, VR::OB, PrimitiveValue::U8(C::from_slice(bytes)))
}

fn meta_elements(meta: &FileMetaTable) -> Vec<InMemElement> {
    let mut elements = vec![
        InMemElement::new(
            tags::FILE_META_INFORMATION_GROUP_LENGTH,
            VR::UL,
            PrimitiveValue::from(meta.information_group_length),
        ),
        bytes_element(
            tags::FILE_META_INFORMATION_VERSION,
            &meta.information_version,
        ),
        str_element(
            tags::MEDIA_STORAGE_SOP_CLASS_UID,
            VR::UI,
            &meta.media_storage_sop_class_uid,
        ),
        str_element(
            tags::MEDIA_STORAGE_SOP_INSTANCE_UID,
            VR::UI,
            &meta.media_storage_sop_instance_uid,
        ),
        str_element(tags::TRANSFER_SYNTAX_UID, VR::UI, &meta.transfer_syntax),
        str_element(
            tags::IMPLEMENTATION_CLASS_UID,
            VR::UI,
            &meta.implementation_class_uid,
        ),
    ];

    let optional = [
        (
            tags::IMPLEMENTATION_VERSION_NAME,
            VR::SH,
            &meta.implementation_version_name,
        ),
        (
            tags::SOURCE_APPLICATION_ENTITY_TITLE,
            VR::AE,
            &meta.source_application_entity_title,
        ),
        (
            tags::SENDING_APPLICATION_ENTITY_TITLE,
            VR::AE,
            &meta.sending_application_entity_title,
        ),
        (
            tags::RECEIVING_APPLICATION_ENTITY_TITLE,
            VR::AE,
            &meta.receiving_application_entity_title,
        ),
        (
            tags::PRIVATE_INFORMATION_CREATOR_UID,
            VR::UI,
            &meta.private_information_creator_uid,
        ),
    ];
    for (tag, vr, value) in optional {
        if let Some(value) = value {
            elements.push(str_element(tag, vr, value));
        }
    }

    if let Some(bytes) = &meta.private_information {
        elements.push(bytes_element(tags::PRIVATE_INFORMATION, bytes));
    }

    elements
}

fn element_bytes(elem: &InMemElement) -> Vec<u8> {
    match elem.value() {
        Value::Primitive(PrimitiveValue::U8(bytes)) => bytes.to_vec(),
        _ => Vec::new(),
    }
}

fn element_string(elem: &InMemElement) -> std::result::Result<String, ActionError> {
    Ok(elem.value().to_str()?.into_owned())
}

fn meta_from_elements(
    elements: &[InMemElement],
) -> std::result::Result<FileMetaTable, ActionError> {
    let mut builder = FileMetaTableBuilder::new();

    for elem in elements {
        builder = match elem.tag() {
            tags::FILE_META_INFORMATION_VERSION => match element_bytes(elem).as_slice() {
                &[major, minor] => builder.information_version([major, minor]),
                _ => builder,
            },
            tags::MEDIA_STORAGE_SOP_CLASS_UID => {
                builder.media_storage_sop_class_uid(element_string(elem)?)
            }
            tags::MEDIA_STORAGE_SOP_INSTANCE_UID => {
                builder.media_storage_sop_instance_uid(element_string(elem)?)
            }
            tags::TRANSFER_SYNTAX_UID => builder.transfer_syntax(element_string(elem)?),
            tags::IMPLEMENTATION_CLASS_UID => {
                builder.implementation_class_uid(element_string(elem)?)
            }
            tags::IMPLEMENTATION_VERSION_NAME => {
                builder.implementation_version_name(element_string(elem)?)
            }
            tags::SOURCE_APPLICATION_ENTITY_TITLE => {
                builder.source_application_entity_title(element_string(elem)?)
            }
            tags::SENDING_APPLICATION_ENTITY_TITLE => {
                builder.sending_application_entity_title(element_string(elem)?)
            }
            tags::RECEIVING_APPLICATION_ENTITY_TITLE => {
                builder.receiving_application_entity_title(element_string(elem)?)
            }
            tags::PRIVATE_INFORMATION_CREATOR_UID => {
                builder.private_information_creator_uid(element_string(elem)?)
            }
            tags::PRIVATE_INFORMATION => builder.private_information(element_bytes(elem)),
            // group length is recomputed when building
            _ => builder,
        };
    }

    builder
        .build()
        .map_err(|e| ActionError::InvalidHeader(format!("{e}")))
}
