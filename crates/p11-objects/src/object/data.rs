use cryptoki_sys::{CKA_APPLICATION, CKA_MECHANISM_TYPE, CKA_OBJECT_ID, CKA_VALUE};

use super::{ObjectKind, StorageObject};
use crate::types::MechanismType;

typed_object! {
    /// Object of unknown class. Only `CKA_CLASS` is allocated, and it may
    /// hold any value.
    pub struct BaseObject = ObjectKind::Object;
    impl [];
}

typed_object! {
    /// Application data (`CKO_DATA`).
    pub struct Data = ObjectKind::Data;
    impl [StorageObject];
    getters {
        application(CKA_APPLICATION) -> str_value: Option<&str>;
        /// DER encoded object identifier of the data's type
        object_id(CKA_OBJECT_ID) -> bytes_value: Option<&[u8]>;
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    /// Mechanism information object (`CKO_MECHANISM`).
    pub struct MechanismObject = ObjectKind::Mechanism;
    impl [];
    getters {
        mechanism_type(CKA_MECHANISM_TYPE) -> ulong_value: Option<MechanismType>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::TypedObject;
    use cryptoki_sys::{CKA_LABEL, CKM_SHA256, CKO_DATA};

    #[test]
    fn data_getters_read_their_slots() {
        let mut data = Data::new();
        assert_eq!(data.class(), Some(CKO_DATA));
        assert_eq!(data.application(), None);

        data.set_attribute(CKA_APPLICATION, "backup").expect("application");
        data.set_attribute(CKA_VALUE, b"payload".as_slice()).expect("value");
        data.set_attribute(CKA_LABEL, "nightly").expect("label");

        assert_eq!(data.application(), Some("backup"));
        assert_eq!(data.value(), Some(b"payload".as_slice()));
        assert_eq!(data.label(), Some("nightly"));
        assert_eq!(data.token(), None);
    }

    #[test]
    fn mechanism_object_has_no_storage_slots() {
        let mut mechanism = MechanismObject::new();
        assert!(mechanism.attribute(CKA_LABEL).is_none());
        mechanism
            .set_attribute(CKA_MECHANISM_TYPE, CKM_SHA256)
            .expect("mechanism type");
        assert_eq!(mechanism.mechanism_type(), Some(CKM_SHA256));
    }
}
