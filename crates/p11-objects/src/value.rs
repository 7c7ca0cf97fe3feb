//! Attribute values and their native payload encoding.

use std::mem::size_of;

use cryptoki_sys::CK_ULONG;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::attribute::RawPayload;
use crate::error::{ObjectError, ObjectResult};
use crate::template::AttributeSet;
use crate::types::{AttributeType, MechanismType};

const ULONG_LEN: usize = size_of::<CK_ULONG>();
const DATE_LEN: usize = 8;

/// Shape of the value an attribute type carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Ulong,
    Bytes,
    Chars,
    Date,
    Mechanism,
    MechanismArray,
    AttributeArray,
}

impl ValueKind {
    /// Kinds transferred as nested or variable-length arrays.
    pub fn is_array(self) -> bool {
        matches!(self, ValueKind::MechanismArray | ValueKind::AttributeArray)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypedValue {
    Bool(bool),
    Ulong(CK_ULONG),
    Bytes(Vec<u8>),
    Chars(String),
    Date(Date),
    Mechanism(MechanismType),
    MechanismArray(Vec<MechanismType>),
    AttributeArray(AttributeSet),
}

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Ulong(_) => ValueKind::Ulong,
            TypedValue::Bytes(_) => ValueKind::Bytes,
            TypedValue::Chars(_) => ValueKind::Chars,
            TypedValue::Date(_) => ValueKind::Date,
            TypedValue::Mechanism(_) => ValueKind::Mechanism,
            TypedValue::MechanismArray(_) => ValueKind::MechanismArray,
            TypedValue::AttributeArray(_) => ValueKind::AttributeArray,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_ulong(&self) -> Option<CK_ULONG> {
        match self {
            TypedValue::Ulong(value) | TypedValue::Mechanism(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TypedValue::Bytes(value) => Some(value.as_slice()),
            TypedValue::Chars(value) => Some(value.as_bytes()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Chars(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            TypedValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_mechanisms(&self) -> Option<&[MechanismType]> {
        match self {
            TypedValue::MechanismArray(value) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn as_attributes(&self) -> Option<&AttributeSet> {
        match self {
            TypedValue::AttributeArray(value) => Some(value),
            _ => None,
        }
    }

    /// Native transfer encoding of this value.
    pub fn encode(&self) -> RawPayload {
        match self {
            TypedValue::Bool(value) => RawPayload::Bytes(vec![u8::from(*value)]),
            TypedValue::Ulong(value) | TypedValue::Mechanism(value) => {
                RawPayload::Bytes(value.to_ne_bytes().to_vec())
            }
            TypedValue::Bytes(value) => RawPayload::Bytes(value.clone()),
            TypedValue::Chars(value) => RawPayload::Bytes(value.as_bytes().to_vec()),
            TypedValue::Date(value) => RawPayload::Bytes(encode_date(*value)),
            TypedValue::MechanismArray(values) => RawPayload::Bytes(
                values
                    .iter()
                    .flat_map(|value| value.to_ne_bytes())
                    .collect(),
            ),
            TypedValue::AttributeArray(set) => RawPayload::Records(set.to_transfer_list()),
        }
    }

    /// Decode a payload for an attribute of the given kind.
    ///
    /// `Ok(None)` means the token reported the attribute without a usable
    /// value (empty payload, blank date).
    pub fn decode(
        attribute: AttributeType,
        kind: ValueKind,
        payload: &RawPayload,
    ) -> ObjectResult<Option<TypedValue>> {
        let bytes = match payload {
            RawPayload::Records(records) => {
                return match kind {
                    ValueKind::AttributeArray => Ok(Some(TypedValue::AttributeArray(
                        AttributeSet::from_transfer_list(records),
                    ))),
                    other => Err(ObjectError::decode(
                        attribute,
                        format!("nested records for a {other:?} attribute"),
                    )),
                };
            }
            RawPayload::Empty => &[][..],
            RawPayload::Bytes(bytes) => bytes.as_slice(),
        };

        if bytes.is_empty() {
            return Ok(match kind {
                ValueKind::Bytes => Some(TypedValue::Bytes(Vec::new())),
                ValueKind::Chars => Some(TypedValue::Chars(String::new())),
                ValueKind::MechanismArray => Some(TypedValue::MechanismArray(Vec::new())),
                _ => None,
            });
        }

        let value = match kind {
            ValueKind::Bool => match bytes {
                [flag] => TypedValue::Bool(*flag != 0),
                _ => {
                    return Err(ObjectError::decode(
                        attribute,
                        format!("boolean payload of {} bytes", bytes.len()),
                    ));
                }
            },
            ValueKind::Ulong => TypedValue::Ulong(decode_ulong(attribute, bytes)?),
            ValueKind::Mechanism => TypedValue::Mechanism(decode_ulong(attribute, bytes)?),
            ValueKind::Bytes => TypedValue::Bytes(bytes.to_vec()),
            ValueKind::Chars => TypedValue::Chars(
                String::from_utf8(bytes.to_vec())
                    .map_err(|err| ObjectError::decode(attribute, err))?,
            ),
            ValueKind::Date => match decode_date(attribute, bytes)? {
                Some(date) => TypedValue::Date(date),
                None => return Ok(None),
            },
            ValueKind::MechanismArray => {
                if bytes.len() % ULONG_LEN != 0 {
                    return Err(ObjectError::decode(
                        attribute,
                        format!("mechanism list of {} bytes", bytes.len()),
                    ));
                }
                let mut mechanisms = Vec::with_capacity(bytes.len() / ULONG_LEN);
                for chunk in bytes.chunks_exact(ULONG_LEN) {
                    mechanisms.push(decode_ulong(attribute, chunk)?);
                }
                TypedValue::MechanismArray(mechanisms)
            }
            ValueKind::AttributeArray => {
                return Err(ObjectError::decode(
                    attribute,
                    "attribute array transferred as flat bytes",
                ));
            }
        };
        Ok(Some(value))
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Bool(value)
    }
}

impl From<CK_ULONG> for TypedValue {
    fn from(value: CK_ULONG) -> Self {
        TypedValue::Ulong(value)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(value: Vec<u8>) -> Self {
        TypedValue::Bytes(value)
    }
}

impl From<&[u8]> for TypedValue {
    fn from(value: &[u8]) -> Self {
        TypedValue::Bytes(value.to_vec())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::Chars(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::Chars(value.to_string())
    }
}

impl From<Date> for TypedValue {
    fn from(value: Date) -> Self {
        TypedValue::Date(value)
    }
}

impl From<AttributeSet> for TypedValue {
    fn from(value: AttributeSet) -> Self {
        TypedValue::AttributeArray(value)
    }
}

fn decode_ulong(attribute: AttributeType, bytes: &[u8]) -> ObjectResult<CK_ULONG> {
    let raw: [u8; ULONG_LEN] = bytes.try_into().map_err(|_| {
        ObjectError::decode(
            attribute,
            format!("expected {ULONG_LEN} bytes, got {}", bytes.len()),
        )
    })?;
    Ok(CK_ULONG::from_ne_bytes(raw))
}

fn encode_date(date: Date) -> Vec<u8> {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
    .into_bytes()
}

/// `CK_DATE` is eight ASCII digits; tokens use blanks or zeros for "no date".
fn decode_date(attribute: AttributeType, bytes: &[u8]) -> ObjectResult<Option<Date>> {
    if bytes.iter().all(|b| *b == b' ' || *b == b'0' || *b == 0) {
        return Ok(None);
    }
    if bytes.len() != DATE_LEN || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(ObjectError::decode(attribute, "date is not YYYYMMDD"));
    }
    let field = |range: std::ops::Range<usize>| -> u32 {
        bytes[range]
            .iter()
            .fold(0u32, |acc, digit| acc * 10 + u32::from(digit - b'0'))
    };
    let year = field(0..4) as i32;
    let month =
        Month::try_from(field(4..6) as u8).map_err(|err| ObjectError::decode(attribute, err))?;
    let day = field(6..8) as u8;
    Date::from_calendar_date(year, month, day)
        .map(Some)
        .map_err(|err| ObjectError::decode(attribute, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoki_sys::{CKA_ALLOWED_MECHANISMS, CKA_START_DATE, CKM_AES_CBC, CKM_SHA256};
    use time::macros::date;

    #[test]
    fn date_uses_ascii_calendar_digits() {
        let payload = TypedValue::Date(date!(2024 - 03 - 09)).encode();
        assert_eq!(payload, RawPayload::Bytes(b"20240309".to_vec()));
        let decoded = TypedValue::decode(CKA_START_DATE, ValueKind::Date, &payload).unwrap();
        assert_eq!(decoded, Some(TypedValue::Date(date!(2024 - 03 - 09))));
    }

    #[test]
    fn blank_date_decodes_to_no_value() {
        let blank = RawPayload::Bytes(b"        ".to_vec());
        assert_eq!(
            TypedValue::decode(CKA_START_DATE, ValueKind::Date, &blank).unwrap(),
            None
        );
        let zeros = RawPayload::Bytes(b"00000000".to_vec());
        assert_eq!(
            TypedValue::decode(CKA_START_DATE, ValueKind::Date, &zeros).unwrap(),
            None
        );
    }

    #[test]
    fn invalid_date_is_a_decode_error() {
        let payload = RawPayload::Bytes(b"20241399".to_vec());
        let err = TypedValue::decode(CKA_START_DATE, ValueKind::Date, &payload).unwrap_err();
        assert!(matches!(err, ObjectError::Decode { .. }));
    }

    #[test]
    fn mechanism_list_splits_native_words() {
        let value = TypedValue::MechanismArray(vec![CKM_AES_CBC, CKM_SHA256]);
        let payload = value.encode();
        let decoded =
            TypedValue::decode(CKA_ALLOWED_MECHANISMS, ValueKind::MechanismArray, &payload)
                .unwrap();
        assert_eq!(decoded, Some(value));

        let ragged = RawPayload::Bytes(vec![0u8; ULONG_LEN + 1]);
        assert!(
            TypedValue::decode(CKA_ALLOWED_MECHANISMS, ValueKind::MechanismArray, &ragged)
                .is_err()
        );
    }

    #[test]
    fn boolean_requires_single_byte() {
        let ok = TypedValue::decode(0x1, ValueKind::Bool, &RawPayload::Bytes(vec![1])).unwrap();
        assert_eq!(ok, Some(TypedValue::Bool(true)));
        assert!(TypedValue::decode(0x1, ValueKind::Bool, &RawPayload::Bytes(vec![1, 0])).is_err());
    }

    #[test]
    fn empty_payload_keeps_empty_strings() {
        assert_eq!(
            TypedValue::decode(0x3, ValueKind::Chars, &RawPayload::Empty).unwrap(),
            Some(TypedValue::Chars(String::new()))
        );
        assert_eq!(
            TypedValue::decode(0x0, ValueKind::Ulong, &RawPayload::Empty).unwrap(),
            None
        );
    }
}
