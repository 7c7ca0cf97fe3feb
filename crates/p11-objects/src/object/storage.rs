use cryptoki_sys::{CKA_LABEL, CKA_MODIFIABLE, CKA_PRIVATE, CKA_TOKEN};

use super::TypedObject;

/// Objects kept on a token or in a session: data, certificates, keys and
/// domain parameters.
pub trait StorageObject: TypedObject {
    attribute_getters! { @trait
        /// `true` for token objects, `false` for session objects
        token(CKA_TOKEN) -> bool_value: Option<bool>;
        private(CKA_PRIVATE) -> bool_value: Option<bool>;
        modifiable(CKA_MODIFIABLE) -> bool_value: Option<bool>;
        label(CKA_LABEL) -> str_value: Option<&str>;
    }
}
