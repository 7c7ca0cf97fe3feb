//! Public, private and secret keys.

use cryptoki_sys::{
    CK_ULONG, CKA_ALLOWED_MECHANISMS, CKA_ALWAYS_AUTHENTICATE, CKA_ALWAYS_SENSITIVE, CKA_BASE,
    CKA_CHECK_VALUE, CKA_COEFFICIENT, CKA_DECRYPT, CKA_DERIVE, CKA_EC_PARAMS, CKA_EC_POINT,
    CKA_ENCRYPT, CKA_END_DATE, CKA_EXPONENT_1, CKA_EXPONENT_2, CKA_EXTRACTABLE, CKA_ID,
    CKA_KEY_GEN_MECHANISM, CKA_KEY_TYPE, CKA_LOCAL, CKA_MODULUS, CKA_MODULUS_BITS,
    CKA_NEVER_EXTRACTABLE, CKA_PRIME, CKA_PRIME_1, CKA_PRIME_2, CKA_PRIVATE_EXPONENT,
    CKA_PUBLIC_EXPONENT, CKA_SENSITIVE, CKA_SIGN, CKA_SIGN_RECOVER, CKA_START_DATE, CKA_SUBJECT,
    CKA_SUBPRIME, CKA_TRUSTED, CKA_UNWRAP, CKA_UNWRAP_TEMPLATE, CKA_VALUE, CKA_VALUE_BITS,
    CKA_VALUE_LEN, CKA_VERIFY, CKA_VERIFY_RECOVER, CKA_WRAP, CKA_WRAP_TEMPLATE,
    CKA_WRAP_WITH_TRUSTED,
};
use time::Date;

use super::{ObjectKind, StorageObject, TypedObject};
use crate::attribute::{CKA_AUTH_PIN_FLAGS, CKA_SECONDARY_AUTH};
use crate::template::AttributeSet;
use crate::types::{KeyType, MechanismType};

pub trait KeyObject: StorageObject {
    attribute_getters! { @trait
        /// Raw `CKA_KEY_TYPE`; vendor key types are kept as read
        key_type(CKA_KEY_TYPE) -> ulong_value: Option<CK_ULONG>;
        id(CKA_ID) -> bytes_value: Option<&[u8]>;
        start_date(CKA_START_DATE) -> date_value: Option<Date>;
        end_date(CKA_END_DATE) -> date_value: Option<Date>;
        derive(CKA_DERIVE) -> bool_value: Option<bool>;
        /// Generated on the token rather than imported
        local(CKA_LOCAL) -> bool_value: Option<bool>;
        key_gen_mechanism(CKA_KEY_GEN_MECHANISM) -> mechanism_value: Option<MechanismType>;
        allowed_mechanisms(CKA_ALLOWED_MECHANISMS) -> mechanisms_value: Option<&[MechanismType]>;
    }
}

pub trait PublicKeyObject: KeyObject {
    attribute_getters! { @trait
        subject(CKA_SUBJECT) -> bytes_value: Option<&[u8]>;
        encrypt(CKA_ENCRYPT) -> bool_value: Option<bool>;
        verify(CKA_VERIFY) -> bool_value: Option<bool>;
        verify_recover(CKA_VERIFY_RECOVER) -> bool_value: Option<bool>;
        wrap(CKA_WRAP) -> bool_value: Option<bool>;
        trusted(CKA_TRUSTED) -> bool_value: Option<bool>;
        /// Keys wrapped with this key must match this template
        wrap_template(CKA_WRAP_TEMPLATE) -> template_value: Option<&AttributeSet>;
    }
}

pub trait PrivateKeyObject: KeyObject {
    attribute_getters! { @trait
        subject(CKA_SUBJECT) -> bytes_value: Option<&[u8]>;
        sensitive(CKA_SENSITIVE) -> bool_value: Option<bool>;
        secondary_auth(CKA_SECONDARY_AUTH) -> bool_value: Option<bool>;
        auth_pin_flags(CKA_AUTH_PIN_FLAGS) -> ulong_value: Option<CK_ULONG>;
        decrypt(CKA_DECRYPT) -> bool_value: Option<bool>;
        sign(CKA_SIGN) -> bool_value: Option<bool>;
        sign_recover(CKA_SIGN_RECOVER) -> bool_value: Option<bool>;
        unwrap(CKA_UNWRAP) -> bool_value: Option<bool>;
        extractable(CKA_EXTRACTABLE) -> bool_value: Option<bool>;
        always_sensitive(CKA_ALWAYS_SENSITIVE) -> bool_value: Option<bool>;
        never_extractable(CKA_NEVER_EXTRACTABLE) -> bool_value: Option<bool>;
        wrap_with_trusted(CKA_WRAP_WITH_TRUSTED) -> bool_value: Option<bool>;
        unwrap_template(CKA_UNWRAP_TEMPLATE) -> template_value: Option<&AttributeSet>;
        always_authenticate(CKA_ALWAYS_AUTHENTICATE) -> bool_value: Option<bool>;
    }
}

pub trait SecretKeyObject: KeyObject {
    attribute_getters! { @trait
        sensitive(CKA_SENSITIVE) -> bool_value: Option<bool>;
        encrypt(CKA_ENCRYPT) -> bool_value: Option<bool>;
        decrypt(CKA_DECRYPT) -> bool_value: Option<bool>;
        sign(CKA_SIGN) -> bool_value: Option<bool>;
        verify(CKA_VERIFY) -> bool_value: Option<bool>;
        wrap(CKA_WRAP) -> bool_value: Option<bool>;
        unwrap(CKA_UNWRAP) -> bool_value: Option<bool>;
        extractable(CKA_EXTRACTABLE) -> bool_value: Option<bool>;
        always_sensitive(CKA_ALWAYS_SENSITIVE) -> bool_value: Option<bool>;
        never_extractable(CKA_NEVER_EXTRACTABLE) -> bool_value: Option<bool>;
        check_value(CKA_CHECK_VALUE) -> bytes_value: Option<&[u8]>;
        wrap_with_trusted(CKA_WRAP_WITH_TRUSTED) -> bool_value: Option<bool>;
        trusted(CKA_TRUSTED) -> bool_value: Option<bool>;
        wrap_template(CKA_WRAP_TEMPLATE) -> template_value: Option<&AttributeSet>;
        unwrap_template(CKA_UNWRAP_TEMPLATE) -> template_value: Option<&AttributeSet>;
    }
}

// Public keys

typed_object! {
    /// Public key of a type without a dedicated layout.
    pub struct BasePublicKey = ObjectKind::PublicKey(None);
    impl [StorageObject, KeyObject, PublicKeyObject];
}

typed_object! {
    pub struct RsaPublicKey = ObjectKind::PublicKey(Some(KeyType::Rsa));
    impl [StorageObject, KeyObject, PublicKeyObject];
    getters {
        modulus(CKA_MODULUS) -> bytes_value: Option<&[u8]>;
        modulus_bits(CKA_MODULUS_BITS) -> ulong_value: Option<CK_ULONG>;
        public_exponent(CKA_PUBLIC_EXPONENT) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct DsaPublicKey = ObjectKind::PublicKey(Some(KeyType::Dsa));
    impl [StorageObject, KeyObject, PublicKeyObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        subprime(CKA_SUBPRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct EcPublicKey = ObjectKind::PublicKey(Some(KeyType::Ec));
    impl [StorageObject, KeyObject, PublicKeyObject];
    getters {
        /// DER encoded curve parameters
        ec_params(CKA_EC_PARAMS) -> bytes_value: Option<&[u8]>;
        /// DER encoded curve point
        ec_point(CKA_EC_POINT) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct DhPublicKey = ObjectKind::PublicKey(Some(KeyType::Dh));
    impl [StorageObject, KeyObject, PublicKeyObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct KeaPublicKey = ObjectKind::PublicKey(Some(KeyType::Kea));
    impl [StorageObject, KeyObject, PublicKeyObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        subprime(CKA_SUBPRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct X942DhPublicKey = ObjectKind::PublicKey(Some(KeyType::X942Dh));
    impl [StorageObject, KeyObject, PublicKeyObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        subprime(CKA_SUBPRIME) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

// Private keys

typed_object! {
    /// Private key of a type without a dedicated layout.
    pub struct BasePrivateKey = ObjectKind::PrivateKey(None);
    impl [StorageObject, KeyObject, PrivateKeyObject];
}

typed_object! {
    pub struct RsaPrivateKey = ObjectKind::PrivateKey(Some(KeyType::Rsa));
    impl [StorageObject, KeyObject, PrivateKeyObject];
    getters {
        modulus(CKA_MODULUS) -> bytes_value: Option<&[u8]>;
        public_exponent(CKA_PUBLIC_EXPONENT) -> bytes_value: Option<&[u8]>;
        private_exponent(CKA_PRIVATE_EXPONENT) -> bytes_value: Option<&[u8]>;
        prime_1(CKA_PRIME_1) -> bytes_value: Option<&[u8]>;
        prime_2(CKA_PRIME_2) -> bytes_value: Option<&[u8]>;
        exponent_1(CKA_EXPONENT_1) -> bytes_value: Option<&[u8]>;
        exponent_2(CKA_EXPONENT_2) -> bytes_value: Option<&[u8]>;
        coefficient(CKA_COEFFICIENT) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct DsaPrivateKey = ObjectKind::PrivateKey(Some(KeyType::Dsa));
    impl [StorageObject, KeyObject, PrivateKeyObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        subprime(CKA_SUBPRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct EcPrivateKey = ObjectKind::PrivateKey(Some(KeyType::Ec));
    impl [StorageObject, KeyObject, PrivateKeyObject];
    getters {
        ec_params(CKA_EC_PARAMS) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct DhPrivateKey = ObjectKind::PrivateKey(Some(KeyType::Dh));
    impl [StorageObject, KeyObject, PrivateKeyObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
        value_bits(CKA_VALUE_BITS) -> ulong_value: Option<CK_ULONG>;
    }
}

typed_object! {
    pub struct KeaPrivateKey = ObjectKind::PrivateKey(Some(KeyType::Kea));
    impl [StorageObject, KeyObject, PrivateKeyObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        subprime(CKA_SUBPRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct X942DhPrivateKey = ObjectKind::PrivateKey(Some(KeyType::X942Dh));
    impl [StorageObject, KeyObject, PrivateKeyObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        subprime(CKA_SUBPRIME) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

// Secret keys

typed_object! {
    /// Secret key of a type without a dedicated layout.
    pub struct BaseSecretKey = ObjectKind::SecretKey(None);
    impl [StorageObject, KeyObject, SecretKeyObject];
}

/// Secret keys whose value length is implied by the algorithm.
macro_rules! fixed_length_secret {
    ($( $name:ident = $key_type:ident; )+) => {
        $(
            typed_object! {
                pub struct $name = ObjectKind::SecretKey(Some(KeyType::$key_type));
                impl [StorageObject, KeyObject, SecretKeyObject];
                getters {
                    value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
                }
            }
        )+
    };
}

/// Secret keys carrying `CKA_VALUE_LEN`.
macro_rules! variable_length_secret {
    ($( $name:ident = $key_type:ident; )+) => {
        $(
            typed_object! {
                pub struct $name = ObjectKind::SecretKey(Some(KeyType::$key_type));
                impl [StorageObject, KeyObject, SecretKeyObject];
                getters {
                    value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
                    /// Key length in bytes
                    value_len(CKA_VALUE_LEN) -> ulong_value: Option<CK_ULONG>;
                }
            }
        )+
    };
}

fixed_length_secret! {
    DesSecretKey = Des;
    Des2SecretKey = Des2;
    Des3SecretKey = Des3;
    IdeaSecretKey = Idea;
    CdmfSecretKey = Cdmf;
    SkipjackSecretKey = Skipjack;
    BatonSecretKey = Baton;
    JuniperSecretKey = Juniper;
}

variable_length_secret! {
    AesSecretKey = Aes;
    GenericSecretKey = GenericSecret;
    Rc2SecretKey = Rc2;
    Rc4SecretKey = Rc4;
    Rc5SecretKey = Rc5;
    CastSecretKey = Cast;
    Cast3SecretKey = Cast3;
    Cast128SecretKey = Cast128;
    BlowfishSecretKey = Blowfish;
    TwofishSecretKey = Twofish;
}

object_enum! {
    pub enum PublicKey {
        Rsa(RsaPublicKey),
        Dsa(DsaPublicKey),
        Ec(EcPublicKey),
        Dh(DhPublicKey),
        Kea(KeaPublicKey),
        X942Dh(X942DhPublicKey),
        Other(BasePublicKey),
    }
    impl [StorageObject, KeyObject, PublicKeyObject];
}

impl PublicKey {
    /// Public key for `key_type`; types without a layout get the base key.
    pub fn new(key_type: Option<KeyType>) -> Self {
        match key_type {
            Some(KeyType::Rsa) => RsaPublicKey::new().into(),
            Some(KeyType::Dsa) => DsaPublicKey::new().into(),
            Some(KeyType::Ec) => EcPublicKey::new().into(),
            Some(KeyType::Dh) => DhPublicKey::new().into(),
            Some(KeyType::Kea) => KeaPublicKey::new().into(),
            Some(KeyType::X942Dh) => X942DhPublicKey::new().into(),
            _ => BasePublicKey::new().into(),
        }
    }
}

object_enum! {
    pub enum PrivateKey {
        Rsa(RsaPrivateKey),
        Dsa(DsaPrivateKey),
        Ec(EcPrivateKey),
        Dh(DhPrivateKey),
        Kea(KeaPrivateKey),
        X942Dh(X942DhPrivateKey),
        Other(BasePrivateKey),
    }
    impl [StorageObject, KeyObject, PrivateKeyObject];
}

impl PrivateKey {
    pub fn new(key_type: Option<KeyType>) -> Self {
        match key_type {
            Some(KeyType::Rsa) => RsaPrivateKey::new().into(),
            Some(KeyType::Dsa) => DsaPrivateKey::new().into(),
            Some(KeyType::Ec) => EcPrivateKey::new().into(),
            Some(KeyType::Dh) => DhPrivateKey::new().into(),
            Some(KeyType::Kea) => KeaPrivateKey::new().into(),
            Some(KeyType::X942Dh) => X942DhPrivateKey::new().into(),
            _ => BasePrivateKey::new().into(),
        }
    }
}

object_enum! {
    pub enum SecretKey {
        Des(DesSecretKey),
        Des2(Des2SecretKey),
        Des3(Des3SecretKey),
        Idea(IdeaSecretKey),
        Cdmf(CdmfSecretKey),
        Skipjack(SkipjackSecretKey),
        Baton(BatonSecretKey),
        Juniper(JuniperSecretKey),
        Aes(AesSecretKey),
        GenericSecret(GenericSecretKey),
        Rc2(Rc2SecretKey),
        Rc4(Rc4SecretKey),
        Rc5(Rc5SecretKey),
        Cast(CastSecretKey),
        Cast3(Cast3SecretKey),
        Cast128(Cast128SecretKey),
        Blowfish(BlowfishSecretKey),
        Twofish(TwofishSecretKey),
        Other(BaseSecretKey),
    }
    impl [StorageObject, KeyObject, SecretKeyObject];
}

impl SecretKey {
    pub fn new(key_type: Option<KeyType>) -> Self {
        let Some(key_type) = key_type else {
            return BaseSecretKey::new().into();
        };
        match key_type {
            KeyType::Des => DesSecretKey::new().into(),
            KeyType::Des2 => Des2SecretKey::new().into(),
            KeyType::Des3 => Des3SecretKey::new().into(),
            KeyType::Idea => IdeaSecretKey::new().into(),
            KeyType::Cdmf => CdmfSecretKey::new().into(),
            KeyType::Skipjack => SkipjackSecretKey::new().into(),
            KeyType::Baton => BatonSecretKey::new().into(),
            KeyType::Juniper => JuniperSecretKey::new().into(),
            KeyType::Aes => AesSecretKey::new().into(),
            KeyType::GenericSecret => GenericSecretKey::new().into(),
            KeyType::Rc2 => Rc2SecretKey::new().into(),
            KeyType::Rc4 => Rc4SecretKey::new().into(),
            KeyType::Rc5 => Rc5SecretKey::new().into(),
            KeyType::Cast => CastSecretKey::new().into(),
            KeyType::Cast3 => Cast3SecretKey::new().into(),
            KeyType::Cast128 => Cast128SecretKey::new().into(),
            KeyType::Blowfish => BlowfishSecretKey::new().into(),
            KeyType::Twofish => TwofishSecretKey::new().into(),
            _ => BaseSecretKey::new().into(),
        }
    }

    /// Raw key value, for the secret key types that carry one.
    pub fn value(&self) -> Option<&[u8]> {
        self.attribute(CKA_VALUE)
            .and_then(crate::attribute::Attribute::bytes_value)
    }
}

/// The two halves produced by key pair generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl KeyPair {
    pub fn new(public_key: impl Into<PublicKey>, private_key: impl Into<PrivateKey>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    /// Empty public and private keys of `key_type`.
    pub fn for_key_type(key_type: KeyType) -> Self {
        Self::new(
            PublicKey::new(Some(key_type)),
            PrivateKey::new(Some(key_type)),
        )
    }

    /// Public and private templates for `C_GenerateKeyPair`.
    pub fn templates(&self) -> (AttributeSet, AttributeSet) {
        (
            self.public_key.build_template(),
            self.private_key.build_template(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Discriminant;
    use crate::value::TypedValue;
    use cryptoki_sys::{CKA_CLASS, CKM_AES_CBC, CKM_AES_GCM, CKM_AES_KEY_GEN};

    #[test]
    fn rsa_public_key_getters() {
        let mut key = RsaPublicKey::new();
        key.set_attribute(CKA_MODULUS, vec![0xC0u8, 0xFF, 0xEE])
            .expect("modulus");
        key.set_attribute(CKA_MODULUS_BITS, 2048 as CK_ULONG)
            .expect("bits");
        key.set_attribute(CKA_VERIFY, true).expect("verify");

        assert_eq!(key.modulus(), Some([0xC0u8, 0xFF, 0xEE].as_slice()));
        assert_eq!(key.modulus_bits(), Some(2048));
        assert_eq!(key.verify(), Some(true));
        assert_eq!(key.encrypt(), None);
        assert_eq!(key.key_type(), Some(KeyType::Rsa.code()));
    }

    #[test]
    fn secret_key_family_dispatches_on_key_type() {
        for key_type in KeyType::ALL.iter().filter(|k| !k.is_asymmetric()) {
            let key = SecretKey::new(Some(*key_type));
            assert!(!matches!(key, SecretKey::Other(_)), "{key_type}");
            assert_eq!(key.key_type(), Some(key_type.code()));
        }
        assert!(matches!(
            SecretKey::new(Some(KeyType::Rsa)),
            SecretKey::Other(_)
        ));
    }

    #[test]
    fn fixed_length_secrets_have_no_value_len() {
        assert!(DesSecretKey::new().attribute(CKA_VALUE_LEN).is_none());
        assert!(AesSecretKey::new().attribute(CKA_VALUE_LEN).is_some());
    }

    #[test]
    fn key_gen_and_allowed_mechanisms() {
        let mut key = AesSecretKey::new();
        key.set_attribute(CKA_KEY_GEN_MECHANISM, TypedValue::Mechanism(CKM_AES_KEY_GEN))
            .expect("key gen mechanism");
        key.set_attribute(
            CKA_ALLOWED_MECHANISMS,
            TypedValue::MechanismArray(vec![CKM_AES_CBC, CKM_AES_GCM]),
        )
        .expect("allowed mechanisms");

        assert_eq!(key.key_gen_mechanism(), Some(CKM_AES_KEY_GEN));
        assert_eq!(
            key.allowed_mechanisms(),
            Some([CKM_AES_CBC, CKM_AES_GCM].as_slice())
        );
    }

    #[test]
    fn wrap_template_holds_nested_attributes() {
        let nested = AttributeSet::new()
            .with(CKA_EXTRACTABLE, false)
            .expect("nested");
        let mut key = RsaPublicKey::new();
        key.set_attribute(CKA_WRAP_TEMPLATE, nested.clone())
            .expect("wrap template");
        assert_eq!(key.wrap_template(), Some(&nested));
    }

    #[test]
    fn key_pair_templates_carry_class_and_key_type() {
        let mut pair = KeyPair::for_key_type(KeyType::Ec);
        pair.public_key
            .set_attribute(CKA_EC_PARAMS, vec![0x06u8, 0x08])
            .expect("params");
        pair.private_key.set_attribute(CKA_SIGN, true).expect("sign");

        let (public, private) = pair.templates();
        assert!(public.contains_type(CKA_CLASS));
        assert!(public.contains_type(CKA_EC_PARAMS));
        assert!(private.contains_type(CKA_KEY_TYPE));
        assert!(private.contains_type(CKA_SIGN));
        assert!(!private.contains_type(CKA_VALUE));
    }

    #[test]
    fn sensitive_slot_hides_its_value() {
        let mut key = RsaPrivateKey::new();
        key.set_attribute(CKA_PRIVATE_EXPONENT, vec![1u8, 2, 3])
            .expect("exponent");
        key.core_mut()
            .attributes_mut()
            .get_mut(CKA_PRIVATE_EXPONENT)
            .expect("slot")
            .mark_sensitive();

        let slot = key.attribute(CKA_PRIVATE_EXPONENT).expect("slot");
        assert!(slot.present());
        assert!(slot.sensitive());
        assert_eq!(key.private_exponent(), None);
        assert_eq!(key.clone().private_exponent(), None);
    }
}
