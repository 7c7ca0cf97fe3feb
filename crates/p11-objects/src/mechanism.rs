//! PKCS#11 mechanism classification.
//!
//! Answers what a mechanism code can be used for (streaming cipher or
//! signature, recovery, digest, key generation, wrapping, derivation) and
//! provides the mechanism name table. Codes missing from the table, vendor
//! mechanisms included, answer `false` to every predicate.

use std::borrow::Cow;
use std::collections::HashMap;

use cryptoki_sys::{
    CKM_AES_CBC, CKM_AES_CBC_ENCRYPT_DATA, CKM_AES_CBC_PAD, CKM_AES_CTR, CKM_AES_ECB,
    CKM_AES_ECB_ENCRYPT_DATA, CKM_AES_GCM, CKM_AES_KEY_GEN, CKM_AES_KEY_WRAP,
    CKM_AES_KEY_WRAP_PAD, CKM_AES_MAC, CKM_AES_MAC_GENERAL, CKM_BLOWFISH_CBC,
    CKM_BLOWFISH_KEY_GEN, CKM_CAST128_CBC, CKM_CAST128_CBC_PAD, CKM_CAST128_ECB,
    CKM_CAST128_KEY_GEN, CKM_CAST128_MAC, CKM_CONCATENATE_BASE_AND_KEY, CKM_DES_CBC,
    CKM_DES_CBC_ENCRYPT_DATA, CKM_DES_CBC_PAD, CKM_DES_ECB, CKM_DES_ECB_ENCRYPT_DATA,
    CKM_DES_KEY_GEN, CKM_DES_MAC, CKM_DES2_KEY_GEN, CKM_DES3_CBC, CKM_DES3_CBC_ENCRYPT_DATA,
    CKM_DES3_CBC_PAD, CKM_DES3_ECB, CKM_DES3_ECB_ENCRYPT_DATA, CKM_DES3_KEY_GEN, CKM_DES3_MAC,
    CKM_DH_PKCS_DERIVE, CKM_DH_PKCS_KEY_PAIR_GEN, CKM_DH_PKCS_PARAMETER_GEN, CKM_DSA,
    CKM_DSA_KEY_PAIR_GEN, CKM_DSA_PARAMETER_GEN, CKM_DSA_SHA1, CKM_EC_KEY_PAIR_GEN,
    CKM_ECDH1_COFACTOR_DERIVE, CKM_ECDH1_DERIVE, CKM_ECDSA, CKM_ECDSA_SHA1, CKM_ECDSA_SHA256,
    CKM_ECDSA_SHA384, CKM_ECDSA_SHA512, CKM_EXTRACT_KEY_FROM_KEY, CKM_GENERIC_SECRET_KEY_GEN,
    CKM_IDEA_CBC, CKM_IDEA_CBC_PAD, CKM_IDEA_ECB, CKM_IDEA_KEY_GEN, CKM_KEA_KEY_DERIVE,
    CKM_KEA_KEY_PAIR_GEN, CKM_MD2, CKM_MD5, CKM_MD5_HMAC, CKM_MD5_RSA_PKCS, CKM_RC2_CBC,
    CKM_RC2_CBC_PAD, CKM_RC2_ECB, CKM_RC2_KEY_GEN, CKM_RC2_MAC, CKM_RC4, CKM_RC4_KEY_GEN,
    CKM_RC5_CBC, CKM_RC5_CBC_PAD, CKM_RC5_ECB, CKM_RC5_KEY_GEN, CKM_RIPEMD160,
    CKM_RIPEMD160_HMAC, CKM_RSA_9796, CKM_RSA_PKCS, CKM_RSA_PKCS_KEY_PAIR_GEN,
    CKM_RSA_PKCS_OAEP, CKM_RSA_PKCS_PSS, CKM_RSA_X_509, CKM_RSA_X9_31,
    CKM_RSA_X9_31_KEY_PAIR_GEN, CKM_SHA_1, CKM_SHA_1_HMAC, CKM_SHA1_KEY_DERIVATION,
    CKM_SHA1_RSA_PKCS, CKM_SHA1_RSA_PKCS_PSS, CKM_SHA224, CKM_SHA224_HMAC, CKM_SHA256,
    CKM_SHA256_HMAC, CKM_SHA256_KEY_DERIVATION, CKM_SHA256_RSA_PKCS, CKM_SHA256_RSA_PKCS_PSS,
    CKM_SHA384, CKM_SHA384_HMAC, CKM_SHA384_KEY_DERIVATION, CKM_SHA384_RSA_PKCS,
    CKM_SHA384_RSA_PKCS_PSS, CKM_SHA512, CKM_SHA512_HMAC, CKM_SHA512_KEY_DERIVATION,
    CKM_SHA512_RSA_PKCS, CKM_SHA512_RSA_PKCS_PSS, CKM_SSL3_KEY_AND_MAC_DERIVE,
    CKM_SSL3_MASTER_KEY_DERIVE, CKM_SSL3_PRE_MASTER_KEY_GEN, CKM_TLS_KEY_AND_MAC_DERIVE,
    CKM_TLS_MASTER_KEY_DERIVE, CKM_TLS_PRE_MASTER_KEY_GEN, CKM_TWOFISH_CBC,
    CKM_TWOFISH_KEY_GEN, CKM_X9_42_DH_DERIVE, CKM_X9_42_DH_KEY_PAIR_GEN,
    CKM_X9_42_DH_PARAMETER_GEN, CKM_XOR_BASE_AND_DATA,
};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::types::{MechanismType, is_vendor_defined};

const FULL_CRYPT: u16 = 1 << 0;
const SINGLE_CRYPT: u16 = 1 << 1;
const FULL_SIGN: u16 = 1 << 2;
const SINGLE_SIGN: u16 = 1 << 3;
const RECOVER: u16 = 1 << 4;
const DIGEST: u16 = 1 << 5;
const KEY_GEN: u16 = 1 << 6;
const KEY_PAIR_GEN: u16 = 1 << 7;
const WRAP: u16 = 1 << 8;
const DERIVE: u16 = 1 << 9;

#[derive(Debug, Clone, Copy)]
struct MechanismInfo {
    name: &'static str,
    flags: u16,
}

macro_rules! mechanism_table {
    ($( $code:ident => $flags:expr, )+) => {
        &[$( ($code, stringify!($code), $flags), )+]
    };
}

static ENTRIES: &[(MechanismType, &str, u16)] = mechanism_table! {
    CKM_RSA_PKCS_KEY_PAIR_GEN => KEY_PAIR_GEN,
    CKM_RSA_X9_31_KEY_PAIR_GEN => KEY_PAIR_GEN,
    CKM_RSA_PKCS => SINGLE_CRYPT | SINGLE_SIGN | RECOVER | WRAP,
    CKM_RSA_9796 => SINGLE_SIGN | RECOVER,
    CKM_RSA_X_509 => SINGLE_CRYPT | SINGLE_SIGN | RECOVER | WRAP,
    CKM_RSA_X9_31 => SINGLE_SIGN,
    CKM_RSA_PKCS_OAEP => SINGLE_CRYPT | WRAP,
    CKM_RSA_PKCS_PSS => SINGLE_SIGN,
    CKM_MD5_RSA_PKCS => FULL_SIGN,
    CKM_SHA1_RSA_PKCS => FULL_SIGN,
    CKM_SHA256_RSA_PKCS => FULL_SIGN,
    CKM_SHA384_RSA_PKCS => FULL_SIGN,
    CKM_SHA512_RSA_PKCS => FULL_SIGN,
    CKM_SHA1_RSA_PKCS_PSS => FULL_SIGN,
    CKM_SHA256_RSA_PKCS_PSS => FULL_SIGN,
    CKM_SHA384_RSA_PKCS_PSS => FULL_SIGN,
    CKM_SHA512_RSA_PKCS_PSS => FULL_SIGN,
    CKM_DSA_KEY_PAIR_GEN => KEY_PAIR_GEN,
    CKM_DSA_PARAMETER_GEN => KEY_GEN,
    CKM_DSA => SINGLE_SIGN,
    CKM_DSA_SHA1 => FULL_SIGN,
    CKM_DH_PKCS_KEY_PAIR_GEN => KEY_PAIR_GEN,
    CKM_DH_PKCS_PARAMETER_GEN => KEY_GEN,
    CKM_DH_PKCS_DERIVE => DERIVE,
    CKM_X9_42_DH_KEY_PAIR_GEN => KEY_PAIR_GEN,
    CKM_X9_42_DH_PARAMETER_GEN => KEY_GEN,
    CKM_X9_42_DH_DERIVE => DERIVE,
    CKM_KEA_KEY_PAIR_GEN => KEY_PAIR_GEN,
    CKM_KEA_KEY_DERIVE => DERIVE,
    CKM_EC_KEY_PAIR_GEN => KEY_PAIR_GEN,
    CKM_ECDSA => SINGLE_SIGN,
    CKM_ECDSA_SHA1 => FULL_SIGN,
    CKM_ECDSA_SHA256 => FULL_SIGN,
    CKM_ECDSA_SHA384 => FULL_SIGN,
    CKM_ECDSA_SHA512 => FULL_SIGN,
    CKM_ECDH1_DERIVE => DERIVE,
    CKM_ECDH1_COFACTOR_DERIVE => DERIVE,
    CKM_GENERIC_SECRET_KEY_GEN => KEY_GEN,
    CKM_RC2_KEY_GEN => KEY_GEN,
    CKM_RC2_ECB => FULL_CRYPT | WRAP,
    CKM_RC2_CBC => FULL_CRYPT | WRAP,
    CKM_RC2_CBC_PAD => FULL_CRYPT | WRAP,
    CKM_RC2_MAC => FULL_SIGN,
    CKM_RC4_KEY_GEN => KEY_GEN,
    CKM_RC4 => FULL_CRYPT,
    CKM_RC5_KEY_GEN => KEY_GEN,
    CKM_RC5_ECB => FULL_CRYPT | WRAP,
    CKM_RC5_CBC => FULL_CRYPT | WRAP,
    CKM_RC5_CBC_PAD => FULL_CRYPT | WRAP,
    CKM_DES_KEY_GEN => KEY_GEN,
    CKM_DES_ECB => FULL_CRYPT | WRAP,
    CKM_DES_CBC => FULL_CRYPT | WRAP,
    CKM_DES_CBC_PAD => FULL_CRYPT | WRAP,
    CKM_DES_MAC => FULL_SIGN,
    CKM_DES2_KEY_GEN => KEY_GEN,
    CKM_DES3_KEY_GEN => KEY_GEN,
    CKM_DES3_ECB => FULL_CRYPT | WRAP,
    CKM_DES3_CBC => FULL_CRYPT | WRAP,
    CKM_DES3_CBC_PAD => FULL_CRYPT | WRAP,
    CKM_DES3_MAC => FULL_SIGN,
    CKM_CAST128_KEY_GEN => KEY_GEN,
    CKM_CAST128_ECB => FULL_CRYPT | WRAP,
    CKM_CAST128_CBC => FULL_CRYPT | WRAP,
    CKM_CAST128_CBC_PAD => FULL_CRYPT | WRAP,
    CKM_CAST128_MAC => FULL_SIGN,
    CKM_IDEA_KEY_GEN => KEY_GEN,
    CKM_IDEA_ECB => FULL_CRYPT | WRAP,
    CKM_IDEA_CBC => FULL_CRYPT | WRAP,
    CKM_IDEA_CBC_PAD => FULL_CRYPT | WRAP,
    CKM_AES_KEY_GEN => KEY_GEN,
    CKM_AES_ECB => FULL_CRYPT | WRAP,
    CKM_AES_CBC => FULL_CRYPT | WRAP,
    CKM_AES_CBC_PAD => FULL_CRYPT | WRAP,
    CKM_AES_CTR => FULL_CRYPT,
    CKM_AES_GCM => FULL_CRYPT,
    CKM_AES_MAC => FULL_SIGN,
    CKM_AES_MAC_GENERAL => FULL_SIGN,
    CKM_AES_KEY_WRAP => WRAP,
    CKM_AES_KEY_WRAP_PAD => WRAP,
    CKM_BLOWFISH_KEY_GEN => KEY_GEN,
    CKM_BLOWFISH_CBC => FULL_CRYPT | WRAP,
    CKM_TWOFISH_KEY_GEN => KEY_GEN,
    CKM_TWOFISH_CBC => FULL_CRYPT | WRAP,
    CKM_MD2 => DIGEST,
    CKM_MD5 => DIGEST,
    CKM_SHA_1 => DIGEST,
    CKM_RIPEMD160 => DIGEST,
    CKM_SHA224 => DIGEST,
    CKM_SHA256 => DIGEST,
    CKM_SHA384 => DIGEST,
    CKM_SHA512 => DIGEST,
    CKM_MD5_HMAC => FULL_SIGN,
    CKM_SHA_1_HMAC => FULL_SIGN,
    CKM_RIPEMD160_HMAC => FULL_SIGN,
    CKM_SHA224_HMAC => FULL_SIGN,
    CKM_SHA256_HMAC => FULL_SIGN,
    CKM_SHA384_HMAC => FULL_SIGN,
    CKM_SHA512_HMAC => FULL_SIGN,
    CKM_SSL3_PRE_MASTER_KEY_GEN => KEY_GEN,
    CKM_TLS_PRE_MASTER_KEY_GEN => KEY_GEN,
    CKM_SSL3_MASTER_KEY_DERIVE => DERIVE,
    CKM_SSL3_KEY_AND_MAC_DERIVE => DERIVE,
    CKM_TLS_MASTER_KEY_DERIVE => DERIVE,
    CKM_TLS_KEY_AND_MAC_DERIVE => DERIVE,
    CKM_CONCATENATE_BASE_AND_KEY => DERIVE,
    CKM_XOR_BASE_AND_DATA => DERIVE,
    CKM_EXTRACT_KEY_FROM_KEY => DERIVE,
    CKM_SHA1_KEY_DERIVATION => DERIVE,
    CKM_SHA256_KEY_DERIVATION => DERIVE,
    CKM_SHA384_KEY_DERIVATION => DERIVE,
    CKM_SHA512_KEY_DERIVATION => DERIVE,
    CKM_DES_ECB_ENCRYPT_DATA => DERIVE,
    CKM_DES_CBC_ENCRYPT_DATA => DERIVE,
    CKM_DES3_ECB_ENCRYPT_DATA => DERIVE,
    CKM_DES3_CBC_ENCRYPT_DATA => DERIVE,
    CKM_AES_ECB_ENCRYPT_DATA => DERIVE,
    CKM_AES_CBC_ENCRYPT_DATA => DERIVE,
};

static MECHANISMS: Lazy<HashMap<MechanismType, MechanismInfo>> = Lazy::new(|| {
    let mut table = HashMap::with_capacity(ENTRIES.len());
    for (code, name, flags) in ENTRIES {
        table
            .entry(*code)
            .and_modify(|info: &mut MechanismInfo| info.flags |= *flags)
            .or_insert(MechanismInfo {
                name: *name,
                flags: *flags,
            });
    }
    table
});

static MECHANISM_CODES: Lazy<HashMap<&'static str, MechanismType>> = Lazy::new(|| {
    ENTRIES
        .iter()
        .map(|(code, name, _)| (*name, *code))
        .collect()
});

/// Build the lookup tables eagerly, e.g. during module initialization.
pub fn init_mechanism_tables() {
    debug!(
        mechanisms = MECHANISMS.len(),
        "initialized PKCS#11 mechanism tables"
    );
}

fn has_flags(mechanism: MechanismType, mask: u16) -> bool {
    MECHANISMS
        .get(&mechanism)
        .is_some_and(|info| info.flags & mask != 0)
}

/// Multi-part (`*Update`/`*Final`) encryption or signing.
pub fn supports_streaming(mechanism: MechanismType) -> bool {
    has_flags(mechanism, FULL_CRYPT | FULL_SIGN)
}

/// Usable only through single-part encrypt/decrypt or sign/verify calls.
pub fn is_single_operation(mechanism: MechanismType) -> bool {
    has_flags(mechanism, SINGLE_CRYPT | SINGLE_SIGN) && !supports_streaming(mechanism)
}

pub fn is_encrypt_decrypt(mechanism: MechanismType) -> bool {
    has_flags(mechanism, FULL_CRYPT | SINGLE_CRYPT)
}

pub fn is_sign_verify(mechanism: MechanismType) -> bool {
    has_flags(mechanism, FULL_SIGN | SINGLE_SIGN)
}

/// `C_SignRecover` / `C_VerifyRecover`.
pub fn supports_recovery(mechanism: MechanismType) -> bool {
    has_flags(mechanism, RECOVER)
}

pub fn is_digest(mechanism: MechanismType) -> bool {
    has_flags(mechanism, DIGEST)
}

/// Secret key or domain parameter generation.
pub fn is_key_gen(mechanism: MechanismType) -> bool {
    has_flags(mechanism, KEY_GEN)
}

pub fn is_key_pair_gen(mechanism: MechanismType) -> bool {
    has_flags(mechanism, KEY_PAIR_GEN)
}

pub fn is_wrap_unwrap(mechanism: MechanismType) -> bool {
    has_flags(mechanism, WRAP)
}

pub fn is_derive(mechanism: MechanismType) -> bool {
    has_flags(mechanism, DERIVE)
}

/// Name of a mechanism code, e.g. `CKM_AES_CBC`.
pub fn mechanism_name(mechanism: MechanismType) -> Cow<'static, str> {
    if let Some(info) = MECHANISMS.get(&mechanism) {
        return Cow::Borrowed(info.name);
    }
    if is_vendor_defined(mechanism) {
        Cow::Owned(format!("VENDOR_DEFINED [{mechanism:#x}]"))
    } else {
        Cow::Owned(format!("[{mechanism:#x}]"))
    }
}

/// Reverse lookup of [`mechanism_name`].
pub fn mechanism_code(name: &str) -> Option<MechanismType> {
    MECHANISM_CODES.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoki_sys::CKM_VENDOR_DEFINED;

    #[test]
    fn block_ciphers_stream_and_wrap() {
        assert!(supports_streaming(CKM_AES_CBC_PAD));
        assert!(is_wrap_unwrap(CKM_AES_CBC_PAD));
        assert!(is_encrypt_decrypt(CKM_AES_CBC_PAD));
        assert!(!is_single_operation(CKM_AES_CBC_PAD));
        assert!(!is_digest(CKM_AES_CBC_PAD));
    }

    #[test]
    fn raw_rsa_is_single_part_with_recovery() {
        assert!(is_single_operation(CKM_RSA_PKCS));
        assert!(supports_recovery(CKM_RSA_PKCS));
        assert!(is_sign_verify(CKM_RSA_PKCS));
        assert!(!supports_streaming(CKM_RSA_PKCS));
        assert!(supports_streaming(CKM_SHA256_RSA_PKCS));
        assert!(!supports_recovery(CKM_SHA256_RSA_PKCS));
    }

    #[test]
    fn generation_and_derivation_are_distinct() {
        assert!(is_key_pair_gen(CKM_EC_KEY_PAIR_GEN));
        assert!(!is_key_gen(CKM_EC_KEY_PAIR_GEN));
        assert!(is_key_gen(CKM_AES_KEY_GEN));
        assert!(is_derive(CKM_ECDH1_DERIVE));
        assert!(is_digest(CKM_SHA256));
    }

    #[test]
    fn unknown_mechanisms_answer_false() {
        for code in [CKM_VENDOR_DEFINED | 0x99, 0x7fff_0000] {
            assert!(!supports_streaming(code));
            assert!(!supports_recovery(code));
            assert!(!is_digest(code));
            assert!(!is_key_gen(code));
            assert!(!is_key_pair_gen(code));
            assert!(!is_wrap_unwrap(code));
            assert!(!is_derive(code));
            assert!(!is_single_operation(code));
        }
    }

    #[test]
    fn names_resolve_both_ways() {
        init_mechanism_tables();
        assert_eq!(mechanism_name(CKM_AES_GCM), "CKM_AES_GCM");
        assert_eq!(mechanism_code("CKM_SHA256_HMAC"), Some(CKM_SHA256_HMAC));
        assert_eq!(mechanism_code("CKM_NOPE"), None);
        assert_eq!(
            mechanism_name(CKM_VENDOR_DEFINED | 1),
            "VENDOR_DEFINED [0x80000001]"
        );
    }
}
