use cryptoki_sys::{CK_ULONG, CKA_BASE, CKA_KEY_TYPE, CKA_LOCAL, CKA_PRIME, CKA_PRIME_BITS, CKA_SUBPRIME};

use super::{ObjectKind, StorageObject};
use crate::attribute::CKA_SUB_PRIME_BITS;
use crate::types::KeyType;

pub trait DomainParametersObject: StorageObject {
    attribute_getters! { @trait
        key_type(CKA_KEY_TYPE) -> ulong_value: Option<CK_ULONG>;
        local(CKA_LOCAL) -> bool_value: Option<bool>;
    }
}

typed_object! {
    /// Domain parameters of a key type without a dedicated layout.
    pub struct BaseDomainParameters = ObjectKind::DomainParameters(None);
    impl [StorageObject, DomainParametersObject];
}

typed_object! {
    pub struct DsaDomainParameters = ObjectKind::DomainParameters(Some(KeyType::Dsa));
    impl [StorageObject, DomainParametersObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        subprime(CKA_SUBPRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        prime_bits(CKA_PRIME_BITS) -> ulong_value: Option<CK_ULONG>;
    }
}

typed_object! {
    pub struct DhDomainParameters = ObjectKind::DomainParameters(Some(KeyType::Dh));
    impl [StorageObject, DomainParametersObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        prime_bits(CKA_PRIME_BITS) -> ulong_value: Option<CK_ULONG>;
    }
}

typed_object! {
    pub struct X942DhDomainParameters = ObjectKind::DomainParameters(Some(KeyType::X942Dh));
    impl [StorageObject, DomainParametersObject];
    getters {
        prime(CKA_PRIME) -> bytes_value: Option<&[u8]>;
        base(CKA_BASE) -> bytes_value: Option<&[u8]>;
        subprime(CKA_SUBPRIME) -> bytes_value: Option<&[u8]>;
        prime_bits(CKA_PRIME_BITS) -> ulong_value: Option<CK_ULONG>;
        sub_prime_bits(CKA_SUB_PRIME_BITS) -> ulong_value: Option<CK_ULONG>;
    }
}

object_enum! {
    pub enum DomainParameters {
        Dsa(DsaDomainParameters),
        Dh(DhDomainParameters),
        X942Dh(X942DhDomainParameters),
        Other(BaseDomainParameters),
    }
    impl [StorageObject, DomainParametersObject];
}

impl DomainParameters {
    pub fn new(key_type: Option<KeyType>) -> Self {
        match key_type {
            Some(KeyType::Dsa) => DsaDomainParameters::new().into(),
            Some(KeyType::Dh) => DhDomainParameters::new().into(),
            Some(KeyType::X942Dh) => X942DhDomainParameters::new().into(),
            _ => BaseDomainParameters::new().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::TypedObject;
    use crate::types::Discriminant;

    #[test]
    fn x942_parameters_carry_sub_prime_bits() {
        let mut params = X942DhDomainParameters::new();
        params
            .set_attribute(CKA_SUB_PRIME_BITS, 256 as CK_ULONG)
            .expect("sub prime bits");
        params
            .set_attribute(CKA_PRIME_BITS, 2048 as CK_ULONG)
            .expect("prime bits");
        assert_eq!(params.sub_prime_bits(), Some(256));
        assert_eq!(params.prime_bits(), Some(2048));
        assert_eq!(params.key_type(), Some(KeyType::X942Dh.code()));
    }

    #[test]
    fn ec_parameters_fall_back_to_base() {
        let params = DomainParameters::new(Some(KeyType::Ec));
        assert!(matches!(params, DomainParameters::Other(_)));
        assert_eq!(params.kind(), ObjectKind::DomainParameters(None));
        assert_eq!(params.key_type(), None);
    }
}
