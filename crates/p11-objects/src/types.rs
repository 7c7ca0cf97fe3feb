//! Code types and discriminator values.
//!
//! PKCS#11 identifies object families and their sub-types with plain
//! `CK_ULONG` codes. This module wraps the codes this crate can build
//! objects for in enums, and classifies everything else as either a
//! vendor-defined value or an unrecognized one.

use std::fmt;

use cryptoki_sys::{
    CK_ATTRIBUTE_TYPE, CK_MECHANISM_TYPE, CK_OBJECT_HANDLE, CK_ULONG, CKA_CERTIFICATE_TYPE,
    CKA_CLASS, CKA_HW_FEATURE_TYPE, CKA_KEY_TYPE, CKC_WTLS, CKC_X_509, CKC_X_509_ATTR_CERT,
    CKH_CLOCK, CKH_MONOTONIC_COUNTER, CKH_USER_INTERFACE, CKK_AES, CKK_BATON, CKK_BLOWFISH,
    CKK_CAST, CKK_CAST3, CKK_CAST128, CKK_CDMF, CKK_DES, CKK_DES2, CKK_DES3, CKK_DH, CKK_DSA,
    CKK_EC, CKK_GENERIC_SECRET, CKK_IDEA, CKK_JUNIPER, CKK_KEA, CKK_RC2, CKK_RC4, CKK_RC5,
    CKK_RSA, CKK_SKIPJACK, CKK_TWOFISH, CKK_X9_42_DH, CKO_CERTIFICATE, CKO_DATA,
    CKO_DOMAIN_PARAMETERS, CKO_HW_FEATURE, CKO_MECHANISM, CKO_PRIVATE_KEY, CKO_PUBLIC_KEY,
    CKO_SECRET_KEY,
};
use serde::{Deserialize, Serialize};

pub type AttributeType = CK_ATTRIBUTE_TYPE;
pub type ObjectHandle = CK_OBJECT_HANDLE;
pub type MechanismType = CK_MECHANISM_TYPE;

/// Bit that marks a code as vendor-defined (`CKA_VENDOR_DEFINED`,
/// `CKO_VENDOR_DEFINED`, `CKK_VENDOR_DEFINED`, ... all share it).
pub const VENDOR_DEFINED_BIT: CK_ULONG = 0x8000_0000;

pub fn is_vendor_defined(code: CK_ULONG) -> bool {
    code & VENDOR_DEFINED_BIT != 0
}

/// A code family whose values select a concrete object shape.
pub trait Discriminant: Copy + Sized + 'static {
    /// Attribute that carries the value on a token object.
    const ATTRIBUTE: AttributeType;

    fn from_code(code: CK_ULONG) -> Option<Self>;
    fn code(self) -> CK_ULONG;
    fn name(self) -> &'static str;
}

/// Classification of a raw discriminator value read from a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discriminator<T> {
    Known(T),
    VendorDefined(CK_ULONG),
    Unrecognized(CK_ULONG),
    Absent,
}

impl<T: Discriminant> Discriminator<T> {
    /// Exact table match wins over the vendor bit.
    pub fn classify(value: Option<CK_ULONG>) -> Self {
        match value {
            None => Discriminator::Absent,
            Some(code) => match T::from_code(code) {
                Some(known) => Discriminator::Known(known),
                None if is_vendor_defined(code) => Discriminator::VendorDefined(code),
                None => Discriminator::Unrecognized(code),
            },
        }
    }

    pub fn known(self) -> Option<T> {
        match self {
            Discriminator::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn raw(self) -> Option<CK_ULONG> {
        match self {
            Discriminator::Known(value) => Some(value.code()),
            Discriminator::VendorDefined(code) | Discriminator::Unrecognized(code) => Some(code),
            Discriminator::Absent => None,
        }
    }
}

/// Human readable name for a discriminator code.
pub fn describe<T: Discriminant>(code: CK_ULONG) -> String {
    match Discriminator::<T>::classify(Some(code)) {
        Discriminator::Known(value) => value.name().to_string(),
        Discriminator::VendorDefined(_) => "Vendor Defined".to_string(),
        _ => "<unknown>".to_string(),
    }
}

macro_rules! discriminant_enum {
    (
        $(#[$meta:meta])*
        $name:ident => $attribute:expr;
        $( $variant:ident = $code:expr, $label:literal; )+
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant, )+];
        }

        impl Discriminant for $name {
            const ATTRIBUTE: AttributeType = $attribute;

            fn from_code(code: CK_ULONG) -> Option<Self> {
                $( if code == $code { return Some($name::$variant); } )+
                None
            }

            fn code(self) -> CK_ULONG {
                match self {
                    $( $name::$variant => $code, )+
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

discriminant_enum! {
    /// Standard object classes (`CKA_CLASS`).
    ObjectClass => CKA_CLASS;
    Data = CKO_DATA, "Data";
    Certificate = CKO_CERTIFICATE, "Certificate";
    PublicKey = CKO_PUBLIC_KEY, "Public Key";
    PrivateKey = CKO_PRIVATE_KEY, "Private Key";
    SecretKey = CKO_SECRET_KEY, "Secret Key";
    HardwareFeature = CKO_HW_FEATURE, "Hardware Feature";
    DomainParameters = CKO_DOMAIN_PARAMETERS, "Domain Parameters";
    Mechanism = CKO_MECHANISM, "Mechanism";
}

discriminant_enum! {
    /// Key types (`CKA_KEY_TYPE`), shared by keys and domain parameters.
    KeyType => CKA_KEY_TYPE;
    Rsa = CKK_RSA, "RSA";
    Dsa = CKK_DSA, "DSA";
    Dh = CKK_DH, "DH";
    Ec = CKK_EC, "EC";
    X942Dh = CKK_X9_42_DH, "X9_42_DH";
    Kea = CKK_KEA, "KEA";
    GenericSecret = CKK_GENERIC_SECRET, "GENERIC_SECRET";
    Rc2 = CKK_RC2, "RC2";
    Rc4 = CKK_RC4, "RC4";
    Des = CKK_DES, "DES";
    Des2 = CKK_DES2, "DES2";
    Des3 = CKK_DES3, "DES3";
    Cast = CKK_CAST, "CAST";
    Cast3 = CKK_CAST3, "CAST3";
    Cast128 = CKK_CAST128, "CAST128";
    Rc5 = CKK_RC5, "RC5";
    Idea = CKK_IDEA, "IDEA";
    Skipjack = CKK_SKIPJACK, "SKIPJACK";
    Baton = CKK_BATON, "BATON";
    Juniper = CKK_JUNIPER, "JUNIPER";
    Cdmf = CKK_CDMF, "CDMF";
    Aes = CKK_AES, "AES";
    Blowfish = CKK_BLOWFISH, "BLOWFISH";
    Twofish = CKK_TWOFISH, "TWOFISH";
}

impl KeyType {
    /// Key types that name an asymmetric algorithm.
    pub fn is_asymmetric(self) -> bool {
        matches!(
            self,
            KeyType::Rsa
                | KeyType::Dsa
                | KeyType::Dh
                | KeyType::Ec
                | KeyType::X942Dh
                | KeyType::Kea
        )
    }
}

discriminant_enum! {
    /// Certificate types (`CKA_CERTIFICATE_TYPE`).
    CertificateType => CKA_CERTIFICATE_TYPE;
    X509PublicKey = CKC_X_509, "X.509 Public Key";
    X509Attribute = CKC_X_509_ATTR_CERT, "X.509 Attribute";
    Wtls = CKC_WTLS, "WTLS";
}

discriminant_enum! {
    /// Hardware feature types (`CKA_HW_FEATURE_TYPE`).
    HardwareFeatureType => CKA_HW_FEATURE_TYPE;
    MonotonicCounter = CKH_MONOTONIC_COUNTER, "Monotonic Counter";
    Clock = CKH_CLOCK, "Clock";
    UserInterface = CKH_USER_INTERFACE, "User Interface";
}

/// Object families that accept an application-provided fallback builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectFamily {
    Object,
    Certificate,
    Key,
    DomainParameters,
    HardwareFeature,
}

impl ObjectFamily {
    pub const ALL: [ObjectFamily; 5] = [
        ObjectFamily::Object,
        ObjectFamily::Certificate,
        ObjectFamily::Key,
        ObjectFamily::DomainParameters,
        ObjectFamily::HardwareFeature,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            ObjectFamily::Object => 0,
            ObjectFamily::Certificate => 1,
            ObjectFamily::Key => 2,
            ObjectFamily::DomainParameters => 3,
            ObjectFamily::HardwareFeature => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoki_sys::{CKK_VENDOR_DEFINED, CKO_VENDOR_DEFINED};

    #[test]
    fn vendor_bit_is_a_mask() {
        assert!(is_vendor_defined(CKO_VENDOR_DEFINED));
        assert!(is_vendor_defined(CKO_VENDOR_DEFINED | 0x42));
        assert!(!is_vendor_defined(CKO_PRIVATE_KEY));
    }

    #[test]
    fn classify_prefers_exact_match() {
        assert_eq!(
            Discriminator::<KeyType>::classify(Some(CKK_RSA)),
            Discriminator::Known(KeyType::Rsa)
        );
        assert_eq!(
            Discriminator::<KeyType>::classify(Some(CKK_VENDOR_DEFINED | 7)),
            Discriminator::VendorDefined(CKK_VENDOR_DEFINED | 7)
        );
        assert_eq!(
            Discriminator::<KeyType>::classify(Some(0x7fff)),
            Discriminator::Unrecognized(0x7fff)
        );
        assert_eq!(Discriminator::<KeyType>::classify(None), Discriminator::Absent);
    }

    #[test]
    fn codes_round_trip_through_tables() {
        for class in ObjectClass::ALL {
            assert_eq!(ObjectClass::from_code(class.code()), Some(*class));
        }
        for key_type in KeyType::ALL {
            assert_eq!(KeyType::from_code(key_type.code()), Some(*key_type));
        }
        for cert in CertificateType::ALL {
            assert_eq!(CertificateType::from_code(cert.code()), Some(*cert));
        }
    }

    #[test]
    fn describe_names_vendor_and_unknown_codes() {
        assert_eq!(describe::<ObjectClass>(CKO_SECRET_KEY), "Secret Key");
        assert_eq!(describe::<ObjectClass>(CKO_VENDOR_DEFINED | 1), "Vendor Defined");
        assert_eq!(describe::<ObjectClass>(0x1234), "<unknown>");
    }

    #[test]
    fn families_index_distinct_slots() {
        let mut seen: Vec<usize> = ObjectFamily::ALL.iter().map(|f| f.index()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), ObjectFamily::ALL.len());
    }
}
