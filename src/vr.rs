use dicom_core::value::{C, DataSetSequence, PrimitiveValue, Value};
use dicom_core::VR;
use dicom_object::mem::{InMemDicomObject, InMemFragment};

/// Returns the value a data element of the given VR is blanked to.
///
/// The mapping is total: every VR gets a blank value, and any VR without a dedicated entry
/// falls back to an empty string. The VR of the element itself is never changed, only its value.
///
/// | VR                   | blank value        |
/// |----------------------|--------------------|
/// | `SQ`                 | empty sequence     |
/// | `OB`, `OW`, `OF`     | empty byte string  |
/// | `UN`                 | empty byte string  |
/// | `US`, `SS`, `UL`, `SL` | `0`              |
/// | `FL`, `FD`           | `0.0`              |
/// | `UI`                 | empty string       |
/// | anything else        | empty string       |
pub fn blank_value(vr: VR) -> Value<InMemDicomObject, InMemFragment> {
    match vr {
        VR::SQ => Value::Sequence(DataSetSequence::empty()),
        VR::OB | VR::OW | VR::OF | VR::UN => Value::Primitive(PrimitiveValue::U8(C::new())),
        VR::US => Value::Primitive(PrimitiveValue::from(0_u16)),
        VR::SS => Value::Primitive(PrimitiveValue::from(0_i16)),
        VR::UL => Value::Primitive(PrimitiveValue::from(0_u32)),
        VR::SL => Value::Primitive(PrimitiveValue::from(0_i32)),
        VR::FL => Value::Primitive(PrimitiveValue::from(0_f32)),
        VR::FD => Value::Primitive(PrimitiveValue::from(0_f64)),
        VR::UI => empty_string(),
        _ => empty_string(),
    }
}

fn empty_string() -> Value<InMemDicomObject, InMemFragment> {
    Value::Primitive(PrimitiveValue::Str(String::new()))
}
