//! PKCS#11 attribute handling.
//!
//! An [`Attribute`] pairs an attribute type code with a value whose kind is
//! fixed by the type, plus the presence and sensitivity flags a token reports
//! when the attribute is read. [`RawRecord`] is the transfer unit exchanged
//! with a token transport.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::size_of;

use cryptoki_sys::{
    CK_ATTRIBUTE, CK_ATTRIBUTE_TYPE, CK_ULONG, CKA_AC_ISSUER, CKA_ALLOWED_MECHANISMS,
    CKA_ALWAYS_AUTHENTICATE, CKA_ALWAYS_SENSITIVE, CKA_APPLICATION, CKA_ATTR_TYPES, CKA_BASE,
    CKA_BITS_PER_PIXEL, CKA_CERTIFICATE_CATEGORY, CKA_CERTIFICATE_TYPE, CKA_CHAR_COLUMNS,
    CKA_CHAR_ROWS, CKA_CHAR_SETS, CKA_CHECK_VALUE, CKA_CLASS, CKA_COEFFICIENT, CKA_COLOR,
    CKA_DECRYPT, CKA_DERIVE, CKA_EC_PARAMS, CKA_EC_POINT, CKA_ENCODING_METHODS, CKA_ENCRYPT,
    CKA_END_DATE, CKA_EXPONENT_1, CKA_EXPONENT_2, CKA_EXTRACTABLE, CKA_HAS_RESET,
    CKA_HASH_OF_ISSUER_PUBLIC_KEY, CKA_HASH_OF_SUBJECT_PUBLIC_KEY, CKA_HW_FEATURE_TYPE, CKA_ID,
    CKA_ISSUER, CKA_JAVA_MIDP_SECURITY_DOMAIN, CKA_KEY_GEN_MECHANISM, CKA_KEY_TYPE, CKA_LABEL,
    CKA_LOCAL, CKA_MECHANISM_TYPE, CKA_MIME_TYPES, CKA_MODIFIABLE, CKA_MODULUS,
    CKA_MODULUS_BITS, CKA_NEVER_EXTRACTABLE, CKA_OBJECT_ID, CKA_OWNER, CKA_PIXEL_X,
    CKA_PIXEL_Y, CKA_PRIME, CKA_PRIME_1, CKA_PRIME_2, CKA_PRIME_BITS, CKA_PRIVATE,
    CKA_PRIVATE_EXPONENT, CKA_PUBLIC_EXPONENT, CKA_RESET_ON_INIT, CKA_RESOLUTION,
    CKA_SENSITIVE, CKA_SERIAL_NUMBER, CKA_SIGN, CKA_SIGN_RECOVER, CKA_START_DATE, CKA_SUBJECT,
    CKA_SUBPRIME,
    CKA_TOKEN, CKA_TRUSTED, CKA_UNWRAP, CKA_UNWRAP_TEMPLATE, CKA_URL, CKA_VALUE, CKA_VALUE_BITS,
    CKA_VALUE_LEN, CKA_VERIFY, CKA_VERIFY_RECOVER, CKA_WRAP, CKA_WRAP_TEMPLATE,
    CKA_WRAP_WITH_TRUSTED,
};
use time::Date;

use crate::error::{ObjectError, ObjectResult, ReadFault};
use crate::template::AttributeSet;
use crate::types::{AttributeType, MechanismType, is_vendor_defined};
use crate::value::{TypedValue, ValueKind};

/// Secondary authentication flag on private keys (deprecated in v2.20 but
/// still reported by older tokens).
pub const CKA_SECONDARY_AUTH: CK_ATTRIBUTE_TYPE = 0x0000_0200;

/// PIN flags for secondary authentication.
pub const CKA_AUTH_PIN_FLAGS: CK_ATTRIBUTE_TYPE = 0x0000_0201;

/// Bit length of the subprime of DSA / X9.42 domain parameters.
pub const CKA_SUB_PRIME_BITS: CK_ATTRIBUTE_TYPE = 0x0000_0134;

/// Value bytes as exchanged with a transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawPayload {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    /// Nested records of an attribute array (`CKF_ARRAY_ATTRIBUTE`).
    Records(Vec<RawRecord>),
}

impl RawPayload {
    /// Length the payload occupies in a native `CK_ATTRIBUTE`.
    pub fn value_len(&self) -> usize {
        match self {
            RawPayload::Empty => 0,
            RawPayload::Bytes(bytes) => bytes.len(),
            RawPayload::Records(records) => records.len() * size_of::<CK_ATTRIBUTE>(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value_len() == 0
    }
}

/// Type code plus opaque value, the only shape a transport consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub attribute_type: AttributeType,
    pub sensitive: bool,
    pub payload: RawPayload,
}

impl RawRecord {
    pub fn new(attribute_type: AttributeType, payload: RawPayload) -> Self {
        Self {
            attribute_type,
            sensitive: false,
            payload,
        }
    }

    pub fn bytes(attribute_type: AttributeType, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(attribute_type, RawPayload::Bytes(bytes.into()))
    }

    pub fn ulong(attribute_type: AttributeType, value: CK_ULONG) -> Self {
        Self::bytes(attribute_type, value.to_ne_bytes().to_vec())
    }

    pub fn bool(attribute_type: AttributeType, value: bool) -> Self {
        Self::bytes(attribute_type, vec![u8::from(value)])
    }

    /// Record announcing a sensitive attribute without its value.
    pub fn sensitive(attribute_type: AttributeType) -> Self {
        Self {
            attribute_type,
            sensitive: true,
            payload: RawPayload::Empty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    attribute_type: AttributeType,
    kind: ValueKind,
    value: Option<TypedValue>,
    present: bool,
    sensitive: bool,
    unrecognized: bool,
}

impl Attribute {
    /// Empty slot for `attribute_type`; the value kind comes from the
    /// attribute table, unknown types hold bytes.
    pub fn new(attribute_type: AttributeType) -> Self {
        Self::with_kind(attribute_type, kind_of(attribute_type))
    }

    /// Empty slot with an explicit value kind, for vendor attributes.
    pub fn with_kind(attribute_type: AttributeType, kind: ValueKind) -> Self {
        Self {
            attribute_type,
            kind,
            value: None,
            present: false,
            sensitive: false,
            unrecognized: false,
        }
    }

    pub fn with_value(
        attribute_type: AttributeType,
        value: impl Into<TypedValue>,
    ) -> ObjectResult<Self> {
        let mut attribute = Self::new(attribute_type);
        attribute.set_value(value)?;
        Ok(attribute)
    }

    /// Stand-in for a nested record that could not be decoded.
    pub fn unrecognized(record: &RawRecord) -> Self {
        let value = match &record.payload {
            RawPayload::Bytes(bytes) => Some(TypedValue::Bytes(bytes.clone())),
            _ => None,
        };
        Self {
            attribute_type: record.attribute_type,
            kind: ValueKind::Bytes,
            value: if record.sensitive { None } else { value },
            present: true,
            sensitive: record.sensitive,
            unrecognized: true,
        }
    }

    /// Decode a transfer record into a fresh attribute.
    pub fn from_transfer_record(record: &RawRecord) -> ObjectResult<Self> {
        let mut attribute = Self::new(record.attribute_type);
        attribute.load(record)?;
        Ok(attribute)
    }

    /// Present class or sub-type slot carrying `code`.
    pub(crate) fn discriminator(attribute_type: AttributeType, code: CK_ULONG) -> Self {
        Self {
            attribute_type,
            kind: ValueKind::Ulong,
            value: Some(TypedValue::Ulong(code)),
            present: true,
            sensitive: false,
            unrecognized: false,
        }
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn present(&self) -> bool {
        self.present
    }

    pub fn sensitive(&self) -> bool {
        self.sensitive
    }

    pub fn is_unrecognized(&self) -> bool {
        self.unrecognized
    }

    /// The value, if the attribute is present and readable.
    pub fn value(&self) -> Option<&TypedValue> {
        if self.present && !self.sensitive {
            self.value.as_ref()
        } else {
            None
        }
    }

    pub fn set_value(&mut self, value: impl Into<TypedValue>) -> ObjectResult<()> {
        let value = value.into();
        if value.kind() != self.kind {
            return Err(ObjectError::TypeMismatch {
                attribute: self.attribute_type,
                expected: self.kind,
                actual: value.kind(),
            });
        }
        self.value = Some(value);
        self.present = true;
        self.sensitive = false;
        self.unrecognized = false;
        Ok(())
    }

    /// Toggle presence. Clearing drops the value and the sensitivity mark.
    pub fn set_present(&mut self, present: bool) {
        self.present = present;
        if !present {
            self.value = None;
            self.sensitive = false;
        }
    }

    pub fn mark_absent(&mut self) {
        self.set_present(false);
    }

    pub fn mark_sensitive(&mut self) {
        self.present = true;
        self.sensitive = true;
        self.value = None;
    }

    /// Load the value carried by a transfer record.
    pub fn load(&mut self, record: &RawRecord) -> ObjectResult<()> {
        if record.sensitive {
            self.mark_sensitive();
            return Ok(());
        }
        let value = TypedValue::decode(self.attribute_type, self.kind, &record.payload)?;
        self.value = value;
        self.present = true;
        self.sensitive = false;
        Ok(())
    }

    /// Apply the outcome of a token read to this slot.
    ///
    /// Only a transport fault or a malformed payload is returned as an error.
    pub fn apply_read(&mut self, outcome: Result<RawRecord, ReadFault>) -> ObjectResult<()> {
        match outcome {
            Ok(record) => self.load(&record),
            Err(ReadFault::TypeInvalid) => {
                self.mark_absent();
                Ok(())
            }
            Err(ReadFault::Sensitive) => {
                self.mark_sensitive();
                Ok(())
            }
            Err(ReadFault::Transport(fault)) => Err(fault.into()),
        }
    }

    /// Transfer record for this attribute; `None` when not present.
    pub fn to_raw_record(&self) -> Option<RawRecord> {
        if !self.present {
            return None;
        }
        if self.sensitive {
            return Some(RawRecord::sensitive(self.attribute_type));
        }
        let payload = self
            .value
            .as_ref()
            .map(TypedValue::encode)
            .unwrap_or_default();
        Some(RawRecord::new(self.attribute_type, payload))
    }

    pub fn name(&self) -> Cow<'static, str> {
        attribute_name(self.attribute_type)
    }

    pub fn bool_value(&self) -> Option<bool> {
        self.value().and_then(TypedValue::as_bool)
    }

    pub fn ulong_value(&self) -> Option<CK_ULONG> {
        self.value().and_then(TypedValue::as_ulong)
    }

    pub fn bytes_value(&self) -> Option<&[u8]> {
        self.value().and_then(TypedValue::as_bytes)
    }

    pub fn str_value(&self) -> Option<&str> {
        self.value().and_then(TypedValue::as_str)
    }

    pub fn date_value(&self) -> Option<Date> {
        self.value().and_then(TypedValue::as_date)
    }

    pub fn mechanism_value(&self) -> Option<MechanismType> {
        match self.value() {
            Some(TypedValue::Mechanism(mechanism)) => Some(*mechanism),
            _ => None,
        }
    }

    pub fn mechanisms_value(&self) -> Option<&[MechanismType]> {
        self.value().and_then(TypedValue::as_mechanisms)
    }

    pub fn template_value(&self) -> Option<&AttributeSet> {
        self.value().and_then(TypedValue::as_attributes)
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        match (self.present, other.present) {
            (false, false) => true,
            (true, true) => {
                self.sensitive == other.sensitive
                    && self.attribute_type == other.attribute_type
                    && self.value() == other.value()
            }
            _ => false,
        }
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.present.hash(state);
        if self.present {
            self.attribute_type.hash(state);
            self.value().hash(state);
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name())?;
        if !self.present {
            return f.write_str("<Attribute not present>");
        }
        if self.sensitive {
            return f.write_str("<Value is sensitive>");
        }
        match self.value() {
            None => f.write_str("<NULL_PTR>"),
            Some(TypedValue::Bool(value)) => write!(f, "{value}"),
            Some(TypedValue::Ulong(value)) => write!(f, "{value:#x}"),
            Some(TypedValue::Bytes(bytes)) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Some(TypedValue::Chars(value)) => f.write_str(value),
            Some(TypedValue::Date(date)) => write!(f, "{date}"),
            Some(TypedValue::Mechanism(code)) => {
                f.write_str(&crate::mechanism::mechanism_name(*code))
            }
            Some(TypedValue::MechanismArray(codes)) => {
                let names: Vec<_> = codes
                    .iter()
                    .map(|code| crate::mechanism::mechanism_name(*code))
                    .collect();
                write!(f, "[{}]", names.join(", "))
            }
            Some(TypedValue::AttributeArray(set)) => write!(f, "{} attributes", set.len()),
        }
    }
}

/// Value kind carried by an attribute type.
pub fn kind_of(attribute_type: AttributeType) -> ValueKind {
    match attribute_type {
        CKA_TOKEN | CKA_PRIVATE | CKA_MODIFIABLE | CKA_TRUSTED | CKA_SENSITIVE | CKA_ENCRYPT
        | CKA_DECRYPT | CKA_WRAP | CKA_UNWRAP | CKA_SIGN | CKA_SIGN_RECOVER | CKA_VERIFY
        | CKA_VERIFY_RECOVER | CKA_DERIVE | CKA_EXTRACTABLE | CKA_LOCAL | CKA_NEVER_EXTRACTABLE
        | CKA_ALWAYS_SENSITIVE | CKA_WRAP_WITH_TRUSTED | CKA_ALWAYS_AUTHENTICATE
        | CKA_SECONDARY_AUTH | CKA_RESET_ON_INIT | CKA_HAS_RESET | CKA_COLOR => ValueKind::Bool,
        CKA_CLASS | CKA_KEY_TYPE | CKA_CERTIFICATE_TYPE | CKA_HW_FEATURE_TYPE
        | CKA_CERTIFICATE_CATEGORY | CKA_JAVA_MIDP_SECURITY_DOMAIN | CKA_MODULUS_BITS
        | CKA_PRIME_BITS | CKA_SUB_PRIME_BITS | CKA_VALUE_BITS | CKA_VALUE_LEN
        | CKA_AUTH_PIN_FLAGS | CKA_PIXEL_X | CKA_PIXEL_Y | CKA_RESOLUTION | CKA_CHAR_ROWS
        | CKA_CHAR_COLUMNS | CKA_BITS_PER_PIXEL | CKA_MECHANISM_TYPE => ValueKind::Ulong,
        CKA_LABEL | CKA_APPLICATION | CKA_URL => ValueKind::Chars,
        CKA_START_DATE | CKA_END_DATE => ValueKind::Date,
        CKA_KEY_GEN_MECHANISM => ValueKind::Mechanism,
        CKA_ALLOWED_MECHANISMS => ValueKind::MechanismArray,
        CKA_WRAP_TEMPLATE | CKA_UNWRAP_TEMPLATE => ValueKind::AttributeArray,
        _ => ValueKind::Bytes,
    }
}

/// Display name of an attribute type.
pub fn attribute_name(attribute_type: AttributeType) -> Cow<'static, str> {
    if is_vendor_defined(attribute_type) {
        return Cow::Owned(format!("VENDOR_DEFINED [{attribute_type:#x}]"));
    }
    let name = match attribute_type {
        CKA_CLASS => "Class",
        CKA_TOKEN => "Token",
        CKA_PRIVATE => "Private",
        CKA_LABEL => "Label",
        CKA_APPLICATION => "Application",
        CKA_VALUE => "Value",
        CKA_OBJECT_ID => "Object ID",
        CKA_CERTIFICATE_TYPE => "Certificate Type",
        CKA_ISSUER => "Issuer",
        CKA_SERIAL_NUMBER => "Serial Number",
        CKA_URL => "URL",
        CKA_HASH_OF_SUBJECT_PUBLIC_KEY => "Hash Of Subject Public Key",
        CKA_HASH_OF_ISSUER_PUBLIC_KEY => "Hash Of Issuer Public Key",
        CKA_JAVA_MIDP_SECURITY_DOMAIN => "Java MIDP Security Domain",
        CKA_AC_ISSUER => "AC Issuer",
        CKA_OWNER => "Owner",
        CKA_ATTR_TYPES => "Attribute Types",
        CKA_TRUSTED => "Trusted",
        CKA_KEY_TYPE => "Key Type",
        CKA_SUBJECT => "Subject",
        CKA_ID => "ID",
        CKA_CHECK_VALUE => "Check Value",
        CKA_CERTIFICATE_CATEGORY => "Certificate Category",
        CKA_SENSITIVE => "Sensitive",
        CKA_ENCRYPT => "Encrypt",
        CKA_DECRYPT => "Decrypt",
        CKA_WRAP => "Wrap",
        CKA_UNWRAP => "Unwrap",
        CKA_WRAP_TEMPLATE => "Wrap Template",
        CKA_UNWRAP_TEMPLATE => "Unwrap Template",
        CKA_SIGN => "Sign",
        CKA_SIGN_RECOVER => "Sign Recover",
        CKA_VERIFY => "Verify",
        CKA_VERIFY_RECOVER => "Verify Recover",
        CKA_DERIVE => "Derive",
        CKA_START_DATE => "Start Date",
        CKA_END_DATE => "End Date",
        CKA_MODULUS => "Modulus",
        CKA_MODULUS_BITS => "Modulus Bits",
        CKA_PUBLIC_EXPONENT => "Public Exponent",
        CKA_PRIVATE_EXPONENT => "Private Exponent",
        CKA_PRIME_1 => "Prime 1",
        CKA_PRIME_2 => "Prime 2",
        CKA_EXPONENT_1 => "Exponent 1",
        CKA_EXPONENT_2 => "Exponent 2",
        CKA_COEFFICIENT => "Coefficient",
        CKA_PRIME => "Prime",
        CKA_SUBPRIME => "Subprime",
        CKA_BASE => "Base",
        CKA_PRIME_BITS => "Prime Bits",
        CKA_SUB_PRIME_BITS => "Subprime Bits",
        CKA_VALUE_BITS => "Value Bits",
        CKA_VALUE_LEN => "Value Length",
        CKA_EXTRACTABLE => "Extractable",
        CKA_LOCAL => "Local",
        CKA_NEVER_EXTRACTABLE => "Never Extractable",
        CKA_WRAP_WITH_TRUSTED => "Wrap With Trusted",
        CKA_ALWAYS_SENSITIVE => "Always Sensitive",
        CKA_ALWAYS_AUTHENTICATE => "Always Authenticate",
        CKA_KEY_GEN_MECHANISM => "Key Generation Mechanism",
        CKA_ALLOWED_MECHANISMS => "Allowed Mechanisms",
        CKA_MODIFIABLE => "Modifiable",
        CKA_EC_PARAMS => "EC Parameters",
        CKA_EC_POINT => "EC Point",
        CKA_SECONDARY_AUTH => "Secondary Authentication",
        CKA_AUTH_PIN_FLAGS => "Authentication PIN Flags",
        CKA_HW_FEATURE_TYPE => "Hardware Feature Type",
        CKA_RESET_ON_INIT => "Reset on Initialization",
        CKA_HAS_RESET => "Has been reset",
        CKA_PIXEL_X => "Pixel X",
        CKA_PIXEL_Y => "Pixel Y",
        CKA_RESOLUTION => "Resolution",
        CKA_CHAR_ROWS => "Character Rows",
        CKA_CHAR_COLUMNS => "Character Columns",
        CKA_COLOR => "Color",
        CKA_BITS_PER_PIXEL => "Bits per Pixel",
        CKA_CHAR_SETS => "Character Sets",
        CKA_ENCODING_METHODS => "Encoding Methods",
        CKA_MIME_TYPES => "MIME Types",
        CKA_MECHANISM_TYPE => "Mechanism Type",
        other => return Cow::Owned(format!("[{other:#x}]")),
    };
    Cow::Borrowed(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoki_sys::{CKA_VENDOR_DEFINED, CKM_AES_KEY_GEN, CKO_SECRET_KEY};
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(attribute: &Attribute) -> u64 {
        let mut hasher = DefaultHasher::new();
        attribute.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn new_attribute_is_empty() {
        let attribute = Attribute::new(CKA_LABEL);
        assert!(!attribute.present());
        assert!(!attribute.sensitive());
        assert!(attribute.value().is_none());
        assert_eq!(attribute.kind(), ValueKind::Chars);
    }

    #[test]
    fn set_value_checks_kind() {
        let mut attribute = Attribute::new(CKA_CLASS);
        let err = attribute.set_value(true).unwrap_err();
        assert!(matches!(
            err,
            ObjectError::TypeMismatch {
                expected: ValueKind::Ulong,
                actual: ValueKind::Bool,
                ..
            }
        ));
        assert!(!attribute.present());

        attribute.set_value(CKO_SECRET_KEY).unwrap();
        assert!(attribute.present());
        assert_eq!(attribute.ulong_value(), Some(CKO_SECRET_KEY));
    }

    #[test]
    fn sensitive_read_hides_value() {
        let mut attribute = Attribute::with_value(CKA_VALUE, vec![1u8, 2, 3]).unwrap();
        attribute.apply_read(Err(ReadFault::Sensitive)).unwrap();
        assert!(attribute.present());
        assert!(attribute.sensitive());
        assert!(attribute.value().is_none());

        let cloned = attribute.clone();
        assert!(cloned.value().is_none());
        assert_eq!(
            cloned.to_raw_record(),
            Some(RawRecord::sensitive(CKA_VALUE))
        );
    }

    #[test]
    fn type_invalid_read_marks_absent() {
        let mut attribute = Attribute::with_value(CKA_LABEL, "old").unwrap();
        attribute.apply_read(Err(ReadFault::TypeInvalid)).unwrap();
        assert!(!attribute.present());
        assert!(attribute.value().is_none());
        assert_eq!(attribute.to_raw_record(), None);
    }

    #[test]
    fn assigned_placeholder_is_recognized() {
        let record = RawRecord::bytes(CKA_VENDOR_DEFINED | 0x7, vec![0xAA, 0xBB]);
        let mut placeholder = Attribute::unrecognized(&record);
        assert!(placeholder.is_unrecognized());

        placeholder.set_value(vec![0x01u8, 0x02]).unwrap();
        assert!(!placeholder.is_unrecognized());
        assert!(placeholder.present());
        assert_eq!(placeholder.bytes_value(), Some([0x01u8, 0x02].as_slice()));
    }

    #[test]
    fn transport_fault_is_surfaced() {
        let mut attribute = Attribute::new(CKA_LABEL);
        let fault = ReadFault::from_rv(cryptoki_sys::CKR_DEVICE_ERROR);
        assert!(matches!(
            attribute.apply_read(Err(fault)),
            Err(ObjectError::Transport(_))
        ));
    }

    #[test]
    fn transfer_record_round_trip() {
        let original = Attribute::with_value(CKA_KEY_GEN_MECHANISM, TypedValue::Mechanism(CKM_AES_KEY_GEN))
            .unwrap();
        let record = original.to_raw_record().unwrap();
        let decoded = Attribute::from_transfer_record(&record).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.mechanism_value(), Some(CKM_AES_KEY_GEN));
    }

    #[test]
    fn absent_attributes_compare_equal() {
        let label = Attribute::new(CKA_LABEL);
        let id = Attribute::new(CKA_ID);
        assert_eq!(label, id);
        assert_eq!(hash_of(&label), hash_of(&id));

        let present = Attribute::with_value(CKA_ID, vec![1u8]).unwrap();
        assert_ne!(present, id);
    }

    #[test]
    fn equality_covers_type_value_and_sensitivity() {
        let a = Attribute::with_value(CKA_SUBJECT, vec![9u8]).unwrap();
        let b = Attribute::with_value(CKA_SUBJECT, vec![9u8]).unwrap();
        let c = Attribute::with_value(CKA_ISSUER, vec![9u8]).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);

        let mut hidden = b.clone();
        hidden.mark_sensitive();
        assert_ne!(a, hidden);
    }

    #[test]
    fn unknown_types_hold_bytes() {
        assert_eq!(kind_of(CKA_VENDOR_DEFINED | 0x10), ValueKind::Bytes);
        assert_eq!(kind_of(CKA_MODULUS), ValueKind::Bytes);
        assert_eq!(kind_of(CKA_ALLOWED_MECHANISMS), ValueKind::MechanismArray);
        assert_eq!(kind_of(CKA_UNWRAP_TEMPLATE), ValueKind::AttributeArray);
    }

    #[test]
    fn names_cover_vendor_and_unknown_codes() {
        assert_eq!(attribute_name(CKA_MODULUS), "Modulus");
        assert_eq!(
            attribute_name(CKA_VENDOR_DEFINED | 0x1),
            "VENDOR_DEFINED [0x80000001]"
        );
        assert_eq!(attribute_name(0x7777), "[0x7777]");
    }

    #[test]
    fn display_never_prints_sensitive_bytes() {
        let mut attribute = Attribute::with_value(CKA_VALUE, vec![0xde, 0xad]).unwrap();
        assert_eq!(attribute.to_string(), "Value: dead");
        attribute.mark_sensitive();
        assert_eq!(attribute.to_string(), "Value: <Value is sensitive>");
    }

    #[test]
    fn payload_length_counts_nested_records() {
        let nested = RawPayload::Records(vec![RawRecord::bool(CKA_ENCRYPT, true)]);
        assert_eq!(nested.value_len(), size_of::<CK_ATTRIBUTE>());
        assert!(RawPayload::Empty.is_empty());
    }
}
