use super::{ObjectCore, ObjectKind, TypedObject};
use crate::types::{AttributeType, ObjectFamily};
use crate::value::ValueKind;

/// Object built by an application fallback builder: the base layout of a
/// family plus any vendor attributes the builder asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorObject {
    core: ObjectCore,
}

impl VendorObject {
    /// Vendor object on top of the base layout for `kind`. Any sub-type in
    /// `kind` is dropped so the builder can set its own.
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            core: ObjectCore::new(kind.base_kind()),
        }
    }

    /// Allocate a vendor slot of the given value kind.
    pub fn with_slot(mut self, attribute_type: AttributeType, kind: ValueKind) -> Self {
        self.core.allocate_slot(attribute_type, kind);
        self
    }

    pub fn with_slots(mut self, slots: &[(AttributeType, ValueKind)]) -> Self {
        for (attribute_type, kind) in slots {
            self.core.allocate_slot(*attribute_type, *kind);
        }
        self
    }

    pub fn family(&self) -> ObjectFamily {
        self.core.kind().family()
    }
}

impl TypedObject for VendorObject {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyType;
    use cryptoki_sys::{CK_ULONG, CKA_KEY_TYPE, CKA_LABEL, CKA_VENDOR_DEFINED, CKO_SECRET_KEY};

    const CKA_VENDOR_WRAP_COUNT: AttributeType = CKA_VENDOR_DEFINED | 0x11;

    #[test]
    fn vendor_slots_sit_on_the_base_layout() {
        let mut object = VendorObject::new(ObjectKind::SecretKey(Some(KeyType::Aes)))
            .with_slot(CKA_VENDOR_WRAP_COUNT, ValueKind::Ulong);

        assert_eq!(object.family(), ObjectFamily::Key);
        assert_eq!(object.class(), Some(CKO_SECRET_KEY));
        assert!(object.attribute(CKA_LABEL).is_some());

        object
            .set_attribute(CKA_KEY_TYPE, CKA_VENDOR_DEFINED | 0x2)
            .expect("base keys leave the key type open");
        object
            .set_attribute(CKA_VENDOR_WRAP_COUNT, 3 as CK_ULONG)
            .expect("vendor slot");
        assert!(object.build_template().contains_type(CKA_VENDOR_WRAP_COUNT));
    }
}
