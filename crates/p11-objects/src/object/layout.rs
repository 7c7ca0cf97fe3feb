//! Attribute slots allocated by each level of the object hierarchy.
//!
//! An object allocates the layers of its kind root to leaf: [`OBJECT`], then
//! (for storage objects) [`STORAGE`], then the family and leaf layers.

use cryptoki_sys::{
    CKA_AC_ISSUER, CKA_ALLOWED_MECHANISMS, CKA_ALWAYS_AUTHENTICATE, CKA_ALWAYS_SENSITIVE,
    CKA_APPLICATION, CKA_ATTR_TYPES, CKA_BASE, CKA_BITS_PER_PIXEL, CKA_CERTIFICATE_CATEGORY,
    CKA_CERTIFICATE_TYPE, CKA_CHAR_COLUMNS, CKA_CHAR_ROWS, CKA_CHAR_SETS, CKA_CHECK_VALUE,
    CKA_CLASS, CKA_COEFFICIENT, CKA_COLOR, CKA_DECRYPT, CKA_DERIVE, CKA_EC_PARAMS, CKA_EC_POINT,
    CKA_ENCODING_METHODS, CKA_ENCRYPT, CKA_END_DATE, CKA_EXPONENT_1, CKA_EXPONENT_2,
    CKA_EXTRACTABLE, CKA_HAS_RESET, CKA_HASH_OF_ISSUER_PUBLIC_KEY,
    CKA_HASH_OF_SUBJECT_PUBLIC_KEY, CKA_HW_FEATURE_TYPE, CKA_ID, CKA_ISSUER,
    CKA_JAVA_MIDP_SECURITY_DOMAIN, CKA_KEY_GEN_MECHANISM, CKA_KEY_TYPE, CKA_LABEL, CKA_LOCAL,
    CKA_MECHANISM_TYPE, CKA_MIME_TYPES, CKA_MODIFIABLE, CKA_MODULUS, CKA_MODULUS_BITS,
    CKA_NEVER_EXTRACTABLE, CKA_OBJECT_ID, CKA_OWNER, CKA_PIXEL_X, CKA_PIXEL_Y, CKA_PRIME,
    CKA_PRIME_1, CKA_PRIME_2, CKA_PRIME_BITS, CKA_PRIVATE, CKA_PRIVATE_EXPONENT,
    CKA_PUBLIC_EXPONENT, CKA_RESET_ON_INIT, CKA_RESOLUTION, CKA_SENSITIVE, CKA_SERIAL_NUMBER,
    CKA_SIGN, CKA_SIGN_RECOVER, CKA_START_DATE, CKA_SUBJECT, CKA_SUBPRIME, CKA_TOKEN,
    CKA_TRUSTED, CKA_UNWRAP, CKA_UNWRAP_TEMPLATE, CKA_URL, CKA_VALUE, CKA_VALUE_BITS,
    CKA_VALUE_LEN, CKA_VERIFY, CKA_VERIFY_RECOVER, CKA_WRAP, CKA_WRAP_TEMPLATE,
    CKA_WRAP_WITH_TRUSTED,
};

use crate::attribute::{CKA_AUTH_PIN_FLAGS, CKA_SECONDARY_AUTH, CKA_SUB_PRIME_BITS};
use crate::types::{AttributeType, CertificateType, HardwareFeatureType, KeyType};

pub type Layout = &'static [AttributeType];

pub const OBJECT: Layout = &[CKA_CLASS];

pub const STORAGE: Layout = &[CKA_TOKEN, CKA_PRIVATE, CKA_MODIFIABLE, CKA_LABEL];

pub const DATA: Layout = &[CKA_APPLICATION, CKA_OBJECT_ID, CKA_VALUE];

pub const MECHANISM: Layout = &[CKA_MECHANISM_TYPE];

pub const KEY: Layout = &[
    CKA_KEY_TYPE,
    CKA_ID,
    CKA_START_DATE,
    CKA_END_DATE,
    CKA_DERIVE,
    CKA_LOCAL,
    CKA_KEY_GEN_MECHANISM,
    CKA_ALLOWED_MECHANISMS,
];

pub const PUBLIC_KEY: Layout = &[
    CKA_SUBJECT,
    CKA_ENCRYPT,
    CKA_VERIFY,
    CKA_VERIFY_RECOVER,
    CKA_WRAP,
    CKA_TRUSTED,
    CKA_WRAP_TEMPLATE,
];

pub const PRIVATE_KEY: Layout = &[
    CKA_SUBJECT,
    CKA_SENSITIVE,
    CKA_SECONDARY_AUTH,
    CKA_AUTH_PIN_FLAGS,
    CKA_DECRYPT,
    CKA_SIGN,
    CKA_SIGN_RECOVER,
    CKA_UNWRAP,
    CKA_EXTRACTABLE,
    CKA_ALWAYS_SENSITIVE,
    CKA_NEVER_EXTRACTABLE,
    CKA_WRAP_WITH_TRUSTED,
    CKA_UNWRAP_TEMPLATE,
    CKA_ALWAYS_AUTHENTICATE,
];

pub const SECRET_KEY: Layout = &[
    CKA_SENSITIVE,
    CKA_ENCRYPT,
    CKA_DECRYPT,
    CKA_SIGN,
    CKA_VERIFY,
    CKA_WRAP,
    CKA_UNWRAP,
    CKA_EXTRACTABLE,
    CKA_ALWAYS_SENSITIVE,
    CKA_NEVER_EXTRACTABLE,
    CKA_CHECK_VALUE,
    CKA_WRAP_WITH_TRUSTED,
    CKA_TRUSTED,
    CKA_WRAP_TEMPLATE,
    CKA_UNWRAP_TEMPLATE,
];

pub const RSA_PUBLIC_KEY: Layout = &[CKA_MODULUS, CKA_MODULUS_BITS, CKA_PUBLIC_EXPONENT];

pub const RSA_PRIVATE_KEY: Layout = &[
    CKA_MODULUS,
    CKA_PUBLIC_EXPONENT,
    CKA_PRIVATE_EXPONENT,
    CKA_PRIME_1,
    CKA_PRIME_2,
    CKA_EXPONENT_1,
    CKA_EXPONENT_2,
    CKA_COEFFICIENT,
];

/// DSA and KEA keys share one layout on both halves of the pair.
pub const DSA_KEY: Layout = &[CKA_PRIME, CKA_SUBPRIME, CKA_BASE, CKA_VALUE];

pub const EC_PUBLIC_KEY: Layout = &[CKA_EC_PARAMS, CKA_EC_POINT];

pub const EC_PRIVATE_KEY: Layout = &[CKA_EC_PARAMS, CKA_VALUE];

pub const DH_PUBLIC_KEY: Layout = &[CKA_PRIME, CKA_BASE, CKA_VALUE];

pub const DH_PRIVATE_KEY: Layout = &[CKA_PRIME, CKA_BASE, CKA_VALUE, CKA_VALUE_BITS];

pub const X942_DH_KEY: Layout = &[CKA_PRIME, CKA_BASE, CKA_SUBPRIME, CKA_VALUE];

/// Secret keys whose length is implied by the algorithm.
pub const FIXED_LENGTH_SECRET: Layout = &[CKA_VALUE];

pub const VARIABLE_LENGTH_SECRET: Layout = &[CKA_VALUE, CKA_VALUE_LEN];

pub const CERTIFICATE: Layout = &[
    CKA_CERTIFICATE_TYPE,
    CKA_TRUSTED,
    CKA_CERTIFICATE_CATEGORY,
    CKA_CHECK_VALUE,
    CKA_START_DATE,
    CKA_END_DATE,
];

pub const X509_PUBLIC_KEY_CERTIFICATE: Layout = &[
    CKA_SUBJECT,
    CKA_ID,
    CKA_ISSUER,
    CKA_SERIAL_NUMBER,
    CKA_VALUE,
    CKA_URL,
    CKA_HASH_OF_SUBJECT_PUBLIC_KEY,
    CKA_HASH_OF_ISSUER_PUBLIC_KEY,
    CKA_JAVA_MIDP_SECURITY_DOMAIN,
];

pub const X509_ATTRIBUTE_CERTIFICATE: Layout = &[
    CKA_OWNER,
    CKA_AC_ISSUER,
    CKA_SERIAL_NUMBER,
    CKA_ATTR_TYPES,
    CKA_VALUE,
];

pub const WTLS_CERTIFICATE: Layout = &[
    CKA_SUBJECT,
    CKA_ISSUER,
    CKA_VALUE,
    CKA_URL,
    CKA_HASH_OF_SUBJECT_PUBLIC_KEY,
    CKA_HASH_OF_ISSUER_PUBLIC_KEY,
];

pub const DOMAIN_PARAMETERS: Layout = &[CKA_KEY_TYPE, CKA_LOCAL];

pub const DSA_PARAMETERS: Layout = &[CKA_PRIME, CKA_SUBPRIME, CKA_BASE, CKA_PRIME_BITS];

pub const DH_PARAMETERS: Layout = &[CKA_PRIME, CKA_BASE, CKA_PRIME_BITS];

pub const X942_DH_PARAMETERS: Layout = &[
    CKA_PRIME,
    CKA_BASE,
    CKA_SUBPRIME,
    CKA_PRIME_BITS,
    CKA_SUB_PRIME_BITS,
];

pub const HW_FEATURE: Layout = &[CKA_HW_FEATURE_TYPE];

pub const MONOTONIC_COUNTER: Layout = &[CKA_VALUE, CKA_RESET_ON_INIT, CKA_HAS_RESET];

pub const CLOCK: Layout = &[CKA_VALUE];

pub const USER_INTERFACE: Layout = &[
    CKA_PIXEL_X,
    CKA_PIXEL_Y,
    CKA_RESOLUTION,
    CKA_CHAR_ROWS,
    CKA_CHAR_COLUMNS,
    CKA_COLOR,
    CKA_BITS_PER_PIXEL,
    CKA_CHAR_SETS,
    CKA_ENCODING_METHODS,
    CKA_MIME_TYPES,
];

pub fn public_key(key_type: KeyType) -> Option<Layout> {
    match key_type {
        KeyType::Rsa => Some(RSA_PUBLIC_KEY),
        KeyType::Dsa | KeyType::Kea => Some(DSA_KEY),
        KeyType::Ec => Some(EC_PUBLIC_KEY),
        KeyType::Dh => Some(DH_PUBLIC_KEY),
        KeyType::X942Dh => Some(X942_DH_KEY),
        _ => None,
    }
}

pub fn private_key(key_type: KeyType) -> Option<Layout> {
    match key_type {
        KeyType::Rsa => Some(RSA_PRIVATE_KEY),
        KeyType::Dsa | KeyType::Kea => Some(DSA_KEY),
        KeyType::Ec => Some(EC_PRIVATE_KEY),
        KeyType::Dh => Some(DH_PRIVATE_KEY),
        KeyType::X942Dh => Some(X942_DH_KEY),
        _ => None,
    }
}

pub fn secret_key(key_type: KeyType) -> Option<Layout> {
    match key_type {
        KeyType::Des
        | KeyType::Des2
        | KeyType::Des3
        | KeyType::Idea
        | KeyType::Cdmf
        | KeyType::Skipjack
        | KeyType::Baton
        | KeyType::Juniper => Some(FIXED_LENGTH_SECRET),
        KeyType::Aes
        | KeyType::GenericSecret
        | KeyType::Rc2
        | KeyType::Rc4
        | KeyType::Rc5
        | KeyType::Cast
        | KeyType::Cast3
        | KeyType::Cast128
        | KeyType::Blowfish
        | KeyType::Twofish => Some(VARIABLE_LENGTH_SECRET),
        _ => None,
    }
}

pub fn domain_parameters(key_type: KeyType) -> Option<Layout> {
    match key_type {
        KeyType::Dsa => Some(DSA_PARAMETERS),
        KeyType::Dh => Some(DH_PARAMETERS),
        KeyType::X942Dh => Some(X942_DH_PARAMETERS),
        _ => None,
    }
}

pub fn certificate(certificate_type: CertificateType) -> Layout {
    match certificate_type {
        CertificateType::X509PublicKey => X509_PUBLIC_KEY_CERTIFICATE,
        CertificateType::X509Attribute => X509_ATTRIBUTE_CERTIFICATE,
        CertificateType::Wtls => WTLS_CERTIFICATE,
    }
}

pub fn hardware_feature(feature: HardwareFeatureType) -> Layout {
    match feature {
        HardwareFeatureType::MonotonicCounter => MONOTONIC_COUNTER,
        HardwareFeatureType::Clock => CLOCK,
        HardwareFeatureType::UserInterface => USER_INTERFACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_asymmetric_key_type_has_both_halves() {
        for key_type in KeyType::ALL.iter().filter(|k| k.is_asymmetric()) {
            assert!(public_key(*key_type).is_some(), "{key_type} public");
            assert!(private_key(*key_type).is_some(), "{key_type} private");
            assert!(secret_key(*key_type).is_none(), "{key_type} secret");
        }
    }

    #[test]
    fn every_symmetric_key_type_has_a_secret_layout() {
        for key_type in KeyType::ALL.iter().filter(|k| !k.is_asymmetric()) {
            assert!(secret_key(*key_type).is_some(), "{key_type}");
        }
    }

    #[test]
    fn layouts_have_no_duplicate_slots() {
        let layouts = [
            OBJECT,
            STORAGE,
            KEY,
            PUBLIC_KEY,
            PRIVATE_KEY,
            SECRET_KEY,
            CERTIFICATE,
            X509_PUBLIC_KEY_CERTIFICATE,
            USER_INTERFACE,
        ];
        for layout in layouts {
            let mut sorted = layout.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), layout.len());
        }
    }
}
