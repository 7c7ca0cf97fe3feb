use cryptoki_sys::{CK_RV, CK_ULONG, CKR_ATTRIBUTE_SENSITIVE, CKR_ATTRIBUTE_TYPE_INVALID};
use thiserror::Error;

use crate::types::{AttributeType, ObjectFamily};
use crate::value::ValueKind;

pub type ObjectResult<T> = Result<T, ObjectError>;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("attribute {attribute:#x} expects a {expected:?} value, got {actual:?}")]
    TypeMismatch {
        attribute: AttributeType,
        expected: ValueKind,
        actual: ValueKind,
    },
    #[error("attribute {attribute:#x} is not allocated by {object}")]
    UnsupportedAttribute {
        attribute: AttributeType,
        object: String,
    },
    #[error("attribute {attribute:#x} is fixed by the {object} class")]
    FixedDiscriminator {
        attribute: AttributeType,
        object: String,
    },
    #[error("no builder resolved {family:?} discriminator {value:?}")]
    UnresolvedDiscriminator {
        family: ObjectFamily,
        value: Option<CK_ULONG>,
    },
    #[error("cannot decode attribute {attribute:#x}: {reason}")]
    Decode {
        attribute: AttributeType,
        reason: String,
    },
    #[error("a {0:?} builder is already registered")]
    AlreadyRegistered(ObjectFamily),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Transport(#[from] TransportFault),
}

impl ObjectError {
    pub fn decode<E: std::fmt::Display>(attribute: AttributeType, err: E) -> Self {
        Self::Decode {
            attribute,
            reason: err.to_string(),
        }
    }
    pub fn config<E: std::fmt::Display>(err: E) -> Self {
        Self::Config(err.to_string())
    }
}

/// Failure reported by the token transport that the object layer cannot
/// recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure (CKR {code:#x}): {message}")]
pub struct TransportFault {
    pub code: CK_RV,
    pub message: String,
}

impl TransportFault {
    pub fn new(code: CK_RV, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Outcome of a failed attribute read.
///
/// `TypeInvalid` and `Sensitive` are ordinary answers from a token and are
/// absorbed per attribute; only `Transport` escapes object resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadFault {
    #[error("attribute type invalid for this object")]
    TypeInvalid,
    #[error("attribute value is sensitive")]
    Sensitive,
    #[error(transparent)]
    Transport(#[from] TransportFault),
}

impl ReadFault {
    /// Map a `C_GetAttributeValue` return code onto a read outcome.
    pub fn from_rv(rv: CK_RV) -> Self {
        match rv {
            CKR_ATTRIBUTE_TYPE_INVALID => ReadFault::TypeInvalid,
            CKR_ATTRIBUTE_SENSITIVE => ReadFault::Sensitive,
            other => ReadFault::Transport(TransportFault::new(other, "attribute read failed")),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ReadFault::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoki_sys::CKR_DEVICE_ERROR;

    #[test]
    fn return_codes_map_to_read_outcomes() {
        assert_eq!(
            ReadFault::from_rv(CKR_ATTRIBUTE_TYPE_INVALID),
            ReadFault::TypeInvalid
        );
        assert_eq!(ReadFault::from_rv(CKR_ATTRIBUTE_SENSITIVE), ReadFault::Sensitive);
        let fault = ReadFault::from_rv(CKR_DEVICE_ERROR);
        assert!(fault.is_transport());
        match fault {
            ReadFault::Transport(inner) => assert_eq!(inner.code, CKR_DEVICE_ERROR),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn transport_fault_converts_into_object_error() {
        let err: ObjectError = TransportFault::new(CKR_DEVICE_ERROR, "device unplugged").into();
        assert!(matches!(err, ObjectError::Transport(_)));
        assert!(err.to_string().contains("device unplugged"));
    }
}
