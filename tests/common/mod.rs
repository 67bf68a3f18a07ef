#![allow(dead_code)]

use dicom_core::header::Header;
use dicom_core::value::{C, DataSetSequence, PrimitiveValue, Value};
use dicom_core::{Length, Tag, VR};
use dicom_deidentify::tags;
use dicom_object::mem::{InMemDicomObject, InMemElement};
use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::{DefaultDicomObject, open_file};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Number of filler attributes in every sample file, on top of the image attributes.
pub const EXTRA_FIELDS: u16 = 50;

const EXTRA_VRS: [VR; 16] = [
    VR::LO,
    VR::SH,
    VR::PN,
    VR::CS,
    VR::DA,
    VR::TM,
    VR::DS,
    VR::IS,
    VR::UI,
    VR::US,
    VR::SS,
    VR::UL,
    VR::SL,
    VR::FL,
    VR::FD,
    VR::OB,
];

fn extra_value(vr: VR, i: u16) -> PrimitiveValue {
    match vr {
        VR::DA => PrimitiveValue::from("20240101"),
        VR::TM => PrimitiveValue::from("120000"),
        VR::DS => PrimitiveValue::from("1.5"),
        VR::IS => PrimitiveValue::from(i.to_string()),
        VR::UI => PrimitiveValue::from("1.2.826.0.1.3680043.2"),
        VR::US => PrimitiveValue::from(i + 1),
        VR::SS => PrimitiveValue::from(-1_i16),
        VR::UL => PrimitiveValue::from(u32::from(i) + 1),
        VR::SL => PrimitiveValue::from(-1_i32),
        VR::FL => PrimitiveValue::from(1.5_f32),
        VR::FD => PrimitiveValue::from(2.5_f64),
        VR::OB => PrimitiveValue::U8(C::from_slice(&[1, 2, 3, 4])),
        _ => PrimitiveValue::from(format!("VALUE{i:02}")),
    }
}

fn element(tag: Tag, vr: VR, value: impl Into<PrimitiveValue>) -> InMemElement {
    InMemElement::new(tag, vr, value.into())
}

/// A 2x2 monochrome image with the given Patient ID, a referenced image sequence and
/// [`EXTRA_FIELDS`] private attributes of mixed VRs.
pub fn sample_object(patient_id: &str) -> DefaultDicomObject {
    let meta = FileMetaTableBuilder::new()
        .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
        .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1")
        .transfer_syntax("1.2.840.10008.1.2.1")
        .build()
        .unwrap();

    let mut obj = DefaultDicomObject::new_empty_with_meta(meta);
    obj.put(element(tags::PATIENT_ID, VR::LO, patient_id));
    obj.put(element(tags::PATIENT_NAME, VR::PN, "Doe^John"));
    obj.put(element(tags::PATIENT_BIRTH_DATE, VR::DA, "19700101"));
    obj.put(element(
        tags::SOP_CLASS_UID,
        VR::UI,
        "1.2.840.10008.5.1.4.1.1.7",
    ));
    obj.put(element(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        "1.2.826.0.1.3680043.2.1",
    ));
    obj.put(element(tags::SAMPLES_PER_PIXEL, VR::US, 1_u16));
    obj.put(element(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        "MONOCHROME2",
    ));
    obj.put(element(tags::ROWS, VR::US, 2_u16));
    obj.put(element(tags::COLUMNS, VR::US, 2_u16));
    obj.put(element(tags::BITS_ALLOCATED, VR::US, 8_u16));
    obj.put(element(tags::BITS_STORED, VR::US, 8_u16));
    obj.put(element(tags::HIGH_BIT, VR::US, 7_u16));
    obj.put(element(tags::PIXEL_REPRESENTATION, VR::US, 0_u16));

    let item = InMemDicomObject::from_element_iter([
        element(
            tags::REFERENCED_SOP_CLASS_UID,
            VR::UI,
            "1.2.840.10008.5.1.4.1.1.7",
        ),
        element(
            tags::REFERENCED_SOP_INSTANCE_UID,
            VR::UI,
            "1.2.826.0.1.3680043.2.9",
        ),
    ]);
    obj.put(InMemElement::new(
        tags::REFERENCED_IMAGE_SEQUENCE,
        VR::SQ,
        Value::Sequence(DataSetSequence::new(vec![item], Length::UNDEFINED)),
    ));

    for i in 0..EXTRA_FIELDS {
        let vr = EXTRA_VRS[usize::from(i) % EXTRA_VRS.len()];
        obj.put(element(Tag(0x0019, 0x1000 + i), vr, extra_value(vr, i)));
    }

    obj.put(InMemElement::new(
        tags::PIXEL_DATA,
        VR::OB,
        PrimitiveValue::U8(C::from_slice(&[0, 64, 128, 255])),
    ));
    obj
}

pub fn write_sample(dir: &Path, file_name: &str, patient_id: &str) -> PathBuf {
    let path = dir.join(file_name);
    sample_object(patient_id).write_to_file(&path).unwrap();
    path
}

/// Whether a decoded element holds the blank value for its VR.
///
/// Empty values may come back from disk as empty strings or as no value at all.
pub fn is_blank(elem: &InMemElement) -> bool {
    let value = elem.value();
    match elem.vr() {
        VR::SQ => elem.items().is_none_or(|items| items.is_empty()),
        VR::OB | VR::OW | VR::OF | VR::UN => value.to_bytes().is_ok_and(|b| b.is_empty()),
        VR::US | VR::SS | VR::UL | VR::SL | VR::FL | VR::FD => {
            value.to_float64().is_ok_and(|v| v == 0.0)
        }
        _ => value
            .to_str()
            .is_ok_and(|s| s.trim_end_matches(['\0', ' ']).is_empty()),
    }
}

pub fn open(path: &Path) -> DefaultDicomObject {
    open_file(path).unwrap()
}

pub struct Workspace {
    pub input: TempDir,
    pub base: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            input: TempDir::new().unwrap(),
            base: TempDir::new().unwrap(),
        }
    }

    pub fn working_dir(&self) -> PathBuf {
        self.base.path().join("updated_dcm_files")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base.path().join("anon_dcm_files")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.base.path().join("patient_ids.csv")
    }
}
