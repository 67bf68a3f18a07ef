use crate::actions::Action;
use crate::tags;
use dicom_core::{DataDictionary, Tag};
use dicom_dictionary_std::StandardDataDictionary;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

/// Tags whose data elements survive de-identification unmodified.
///
/// These are the attributes needed to decode and display the pixel data, plus the SOP Class UID
/// and the Transfer Syntax UID of the file meta group.
pub const REQUIRED_TAGS: [Tag; 11] = [
    tags::PIXEL_DATA,
    tags::ROWS,
    tags::COLUMNS,
    tags::BITS_ALLOCATED,
    tags::BITS_STORED,
    tags::HIGH_BIT,
    tags::PIXEL_REPRESENTATION,
    tags::PHOTOMETRIC_INTERPRETATION,
    tags::SAMPLES_PER_PIXEL,
    tags::SOP_CLASS_UID,
    tags::TRANSFER_SYNTAX_UID,
];

/// The set of tags exempt from blanking.
///
/// [`AllowList::default()`] is the fixed policy built from [`REQUIRED_TAGS`]. It is matched by exact
/// tag equality, so a tag is either kept entirely or blanked.
#[derive(Debug, Clone, PartialEq)]
pub struct AllowList(BTreeSet<Tag>);

impl AllowList {
    pub(crate) fn from_tags<I>(tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        AllowList(tags.into_iter().collect())
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    /// Returns the [`Action`] to take for a given DICOM tag.
    ///
    /// Allow-listed tags are kept, every other tag is blanked.
    pub fn get_action(&self, tag: &Tag) -> Action {
        if self.contains(tag) {
            Action::Keep
        } else {
            Action::Blank
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::from_tags(REQUIRED_TAGS)
    }
}

// Function to get the tag alias from the data dictionary
fn get_tag_alias(tag: &Tag) -> Option<&'static str> {
    let data_dict = StandardDataDictionary;
    data_dict.by_tag(*tag).map(|entry| entry.alias)
}

impl Serialize for AllowList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;

        for tag in &self.0 {
            // e.g. "(0028,0010)": "Rows"
            map.serialize_entry(&format!("{}", tag), &get_tag_alias(tag))?;
        }

        map.end()
    }
}
