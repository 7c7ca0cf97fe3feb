use cryptoki_sys::{
    CK_ULONG, CKA_AC_ISSUER, CKA_ATTR_TYPES, CKA_CERTIFICATE_CATEGORY, CKA_CERTIFICATE_TYPE,
    CKA_CHECK_VALUE, CKA_END_DATE, CKA_HASH_OF_ISSUER_PUBLIC_KEY,
    CKA_HASH_OF_SUBJECT_PUBLIC_KEY, CKA_ID, CKA_ISSUER, CKA_JAVA_MIDP_SECURITY_DOMAIN, CKA_OWNER,
    CKA_SERIAL_NUMBER, CKA_START_DATE, CKA_SUBJECT, CKA_TRUSTED, CKA_URL, CKA_VALUE,
};
use time::Date;

use super::{ObjectKind, StorageObject};
use crate::types::CertificateType;

pub trait CertificateObject: StorageObject {
    attribute_getters! { @trait
        certificate_type(CKA_CERTIFICATE_TYPE) -> ulong_value: Option<CK_ULONG>;
        trusted(CKA_TRUSTED) -> bool_value: Option<bool>;
        /// 0 unspecified, 1 token user, 2 authority, 3 other entity
        certificate_category(CKA_CERTIFICATE_CATEGORY) -> ulong_value: Option<CK_ULONG>;
        check_value(CKA_CHECK_VALUE) -> bytes_value: Option<&[u8]>;
        start_date(CKA_START_DATE) -> date_value: Option<Date>;
        end_date(CKA_END_DATE) -> date_value: Option<Date>;
    }
}

typed_object! {
    /// Certificate of a type without a dedicated layout.
    pub struct BaseCertificate = ObjectKind::Certificate(None);
    impl [StorageObject, CertificateObject];
}

typed_object! {
    pub struct X509PublicKeyCertificate =
        ObjectKind::Certificate(Some(CertificateType::X509PublicKey));
    impl [StorageObject, CertificateObject];
    getters {
        subject(CKA_SUBJECT) -> bytes_value: Option<&[u8]>;
        id(CKA_ID) -> bytes_value: Option<&[u8]>;
        issuer(CKA_ISSUER) -> bytes_value: Option<&[u8]>;
        serial_number(CKA_SERIAL_NUMBER) -> bytes_value: Option<&[u8]>;
        /// DER encoded certificate
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
        url(CKA_URL) -> str_value: Option<&str>;
        hash_of_subject_public_key(CKA_HASH_OF_SUBJECT_PUBLIC_KEY) -> bytes_value: Option<&[u8]>;
        hash_of_issuer_public_key(CKA_HASH_OF_ISSUER_PUBLIC_KEY) -> bytes_value: Option<&[u8]>;
        java_midp_security_domain(CKA_JAVA_MIDP_SECURITY_DOMAIN) -> ulong_value: Option<CK_ULONG>;
    }
}

typed_object! {
    pub struct X509AttributeCertificate =
        ObjectKind::Certificate(Some(CertificateType::X509Attribute));
    impl [StorageObject, CertificateObject];
    getters {
        owner(CKA_OWNER) -> bytes_value: Option<&[u8]>;
        ac_issuer(CKA_AC_ISSUER) -> bytes_value: Option<&[u8]>;
        serial_number(CKA_SERIAL_NUMBER) -> bytes_value: Option<&[u8]>;
        attr_types(CKA_ATTR_TYPES) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct WtlsCertificate = ObjectKind::Certificate(Some(CertificateType::Wtls));
    impl [StorageObject, CertificateObject];
    getters {
        subject(CKA_SUBJECT) -> bytes_value: Option<&[u8]>;
        issuer(CKA_ISSUER) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
        url(CKA_URL) -> str_value: Option<&str>;
        hash_of_subject_public_key(CKA_HASH_OF_SUBJECT_PUBLIC_KEY) -> bytes_value: Option<&[u8]>;
        hash_of_issuer_public_key(CKA_HASH_OF_ISSUER_PUBLIC_KEY) -> bytes_value: Option<&[u8]>;
    }
}

object_enum! {
    pub enum Certificate {
        X509PublicKey(X509PublicKeyCertificate),
        X509Attribute(X509AttributeCertificate),
        Wtls(WtlsCertificate),
        Other(BaseCertificate),
    }
    impl [StorageObject, CertificateObject];
}

impl Certificate {
    pub fn new(certificate_type: Option<CertificateType>) -> Self {
        match certificate_type {
            Some(CertificateType::X509PublicKey) => X509PublicKeyCertificate::new().into(),
            Some(CertificateType::X509Attribute) => X509AttributeCertificate::new().into(),
            Some(CertificateType::Wtls) => WtlsCertificate::new().into(),
            None => BaseCertificate::new().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::TypedObject;
    use crate::types::Discriminant;
    use cryptoki_sys::{CKA_LABEL, CKC_X_509};

    #[test]
    fn x509_certificate_slots() {
        let mut cert = X509PublicKeyCertificate::new();
        assert_eq!(cert.certificate_type(), Some(CKC_X_509));
        cert.set_attribute(CKA_URL, "https://pki.example/ca.crt")
            .expect("url");
        cert.set_attribute(CKA_CERTIFICATE_CATEGORY, 2 as CK_ULONG)
            .expect("category");
        cert.set_attribute(CKA_LABEL, "issuing-ca").expect("label");

        assert_eq!(cert.url(), Some("https://pki.example/ca.crt"));
        assert_eq!(cert.certificate_category(), Some(2));
        assert_eq!(cert.label(), Some("issuing-ca"));
        assert_eq!(cert.value(), None);
    }

    #[test]
    fn certificate_family_dispatches_on_type() {
        for certificate_type in CertificateType::ALL {
            let cert = Certificate::new(Some(*certificate_type));
            assert_eq!(cert.certificate_type(), Some(certificate_type.code()));
        }
        let base = Certificate::new(None);
        assert!(matches!(base, Certificate::Other(_)));
        assert_eq!(base.certificate_type(), None);
        assert!(base.attribute(CKA_CERTIFICATE_TYPE).is_some());
    }
}
