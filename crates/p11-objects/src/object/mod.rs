//! Typed token objects.
//!
//! Every object owns one [`AttributeSet`] holding the slots allocated by each
//! level of its kind (see [`layout`]). Class and sub-type slots are fixed at
//! construction; all other slots start absent and are filled by the
//! resolver or by the caller.

use std::fmt;

use cryptoki_sys::{CK_ULONG, CKA_CLASS};

use crate::attribute::{Attribute, RawRecord};
use crate::error::{ObjectError, ObjectResult};
use crate::template::AttributeSet;
use crate::types::{
    AttributeType, CertificateType, Discriminant, HardwareFeatureType, KeyType, ObjectClass,
    ObjectFamily, ObjectHandle,
};
use crate::value::{TypedValue, ValueKind};

/// Typed getters reading one slot each. Expands to trait default methods
/// with `@trait`, to public inherent methods otherwise.
macro_rules! attribute_getters {
    (@trait $( $(#[$meta:meta])* $getter:ident($attr:expr) -> $accessor:ident: $ret:ty; )*) => {
        $(
            $(#[$meta])*
            fn $getter(&self) -> $ret {
                $crate::object::TypedObject::attribute(self, $attr)
                    .and_then($crate::attribute::Attribute::$accessor)
            }
        )*
    };
    ($( $(#[$meta:meta])* $getter:ident($attr:expr) -> $accessor:ident: $ret:ty; )*) => {
        $(
            $(#[$meta])*
            pub fn $getter(&self) -> $ret {
                $crate::object::TypedObject::attribute(self, $attr)
                    .and_then($crate::attribute::Attribute::$accessor)
            }
        )*
    };
}

/// Leaf object type of a fixed [`ObjectKind`].
macro_rules! typed_object {
    (
        $(#[$meta:meta])*
        pub struct $name:ident = $kind:expr;
        impl [$($layer:path),* $(,)?];
        $( getters { $($getters:tt)* } )?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            core: $crate::object::ObjectCore,
        }

        impl $name {
            pub const KIND: $crate::object::ObjectKind = $kind;

            pub fn new() -> Self {
                Self {
                    core: $crate::object::ObjectCore::new(Self::KIND),
                }
            }

            $( attribute_getters! { $($getters)* } )?
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::object::TypedObject for $name {
            fn core(&self) -> &$crate::object::ObjectCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut $crate::object::ObjectCore {
                &mut self.core
            }
        }

        $( impl $layer for $name {} )*
    };
}

/// Closed set of object types sharing one family, dispatched by match.
macro_rules! object_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident($ty:ty) ),+ $(,)?
        }
        impl [$($layer:path),* $(,)?];
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $name {
            $( $variant($ty), )+
        }

        impl $crate::object::TypedObject for $name {
            fn core(&self) -> &$crate::object::ObjectCore {
                match self {
                    $( $name::$variant(inner) => $crate::object::TypedObject::core(inner), )+
                }
            }

            fn core_mut(&mut self) -> &mut $crate::object::ObjectCore {
                match self {
                    $( $name::$variant(inner) => $crate::object::TypedObject::core_mut(inner), )+
                }
            }
        }

        $( impl $layer for $name {} )*

        $(
            impl From<$ty> for $name {
                fn from(inner: $ty) -> Self {
                    $name::$variant(inner)
                }
            }
        )+
    };
}

pub mod layout;

mod certificate;
mod data;
mod domain;
mod hw_feature;
mod key;
mod storage;
mod vendor;

pub use certificate::{
    BaseCertificate, Certificate, CertificateObject, WtlsCertificate, X509AttributeCertificate,
    X509PublicKeyCertificate,
};
pub use data::{BaseObject, Data, MechanismObject};
pub use domain::{
    BaseDomainParameters, DhDomainParameters, DomainParameters, DomainParametersObject,
    DsaDomainParameters, X942DhDomainParameters,
};
pub use hw_feature::{
    BaseHardwareFeature, Clock, HardwareFeature, HardwareFeatureObject, MonotonicCounter,
    UserInterface,
};
pub use key::{
    AesSecretKey, BasePrivateKey, BasePublicKey, BaseSecretKey, BatonSecretKey,
    BlowfishSecretKey, Cast3SecretKey, Cast128SecretKey, CastSecretKey, CdmfSecretKey,
    Des2SecretKey, Des3SecretKey, DesSecretKey, DhPrivateKey, DhPublicKey, DsaPrivateKey,
    DsaPublicKey, EcPrivateKey, EcPublicKey, GenericSecretKey, IdeaSecretKey, JuniperSecretKey,
    KeaPrivateKey, KeaPublicKey, KeyObject, KeyPair, PrivateKey, PrivateKeyObject, PublicKey,
    PublicKeyObject, Rc2SecretKey, Rc4SecretKey, Rc5SecretKey, RsaPrivateKey, RsaPublicKey,
    SecretKey, SecretKeyObject, SkipjackSecretKey, TwofishSecretKey, X942DhPrivateKey,
    X942DhPublicKey,
};
pub use storage::StorageObject;
pub use vendor::VendorObject;

/// Concrete object type: class plus the sub-type discriminator of families
/// that have one. A `None` sub-type is the family's base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Object whose class is unknown or unreadable.
    Object,
    Data,
    Mechanism,
    Certificate(Option<CertificateType>),
    PublicKey(Option<KeyType>),
    PrivateKey(Option<KeyType>),
    SecretKey(Option<KeyType>),
    DomainParameters(Option<KeyType>),
    HardwareFeature(Option<HardwareFeatureType>),
}

impl ObjectKind {
    /// Kind of the base object for `class`.
    pub fn base(class: ObjectClass) -> Self {
        match class {
            ObjectClass::Data => ObjectKind::Data,
            ObjectClass::Mechanism => ObjectKind::Mechanism,
            ObjectClass::Certificate => ObjectKind::Certificate(None),
            ObjectClass::PublicKey => ObjectKind::PublicKey(None),
            ObjectClass::PrivateKey => ObjectKind::PrivateKey(None),
            ObjectClass::SecretKey => ObjectKind::SecretKey(None),
            ObjectClass::DomainParameters => ObjectKind::DomainParameters(None),
            ObjectClass::HardwareFeature => ObjectKind::HardwareFeature(None),
        }
    }

    pub fn class(self) -> Option<ObjectClass> {
        match self {
            ObjectKind::Object => None,
            ObjectKind::Data => Some(ObjectClass::Data),
            ObjectKind::Mechanism => Some(ObjectClass::Mechanism),
            ObjectKind::Certificate(_) => Some(ObjectClass::Certificate),
            ObjectKind::PublicKey(_) => Some(ObjectClass::PublicKey),
            ObjectKind::PrivateKey(_) => Some(ObjectClass::PrivateKey),
            ObjectKind::SecretKey(_) => Some(ObjectClass::SecretKey),
            ObjectKind::DomainParameters(_) => Some(ObjectClass::DomainParameters),
            ObjectKind::HardwareFeature(_) => Some(ObjectClass::HardwareFeature),
        }
    }

    pub fn family(self) -> ObjectFamily {
        match self {
            ObjectKind::Object | ObjectKind::Data | ObjectKind::Mechanism => ObjectFamily::Object,
            ObjectKind::Certificate(_) => ObjectFamily::Certificate,
            ObjectKind::PublicKey(_) | ObjectKind::PrivateKey(_) | ObjectKind::SecretKey(_) => {
                ObjectFamily::Key
            }
            ObjectKind::DomainParameters(_) => ObjectFamily::DomainParameters,
            ObjectKind::HardwareFeature(_) => ObjectFamily::HardwareFeature,
        }
    }

    /// The family base kind with the sub-type dropped.
    pub fn base_kind(self) -> Self {
        self.class().map(ObjectKind::base).unwrap_or(ObjectKind::Object)
    }

    /// Drop a sub-type that has no leaf layout, e.g. an AES public key.
    pub fn normalize(self) -> Self {
        let supported = match self {
            ObjectKind::PublicKey(Some(key_type)) => layout::public_key(key_type).is_some(),
            ObjectKind::PrivateKey(Some(key_type)) => layout::private_key(key_type).is_some(),
            ObjectKind::SecretKey(Some(key_type)) => layout::secret_key(key_type).is_some(),
            ObjectKind::DomainParameters(Some(key_type)) => {
                layout::domain_parameters(key_type).is_some()
            }
            _ => true,
        };
        if supported { self } else { self.base_kind() }
    }

    /// Slot layers root to leaf.
    pub fn layers(self) -> Vec<layout::Layout> {
        let mut layers = vec![layout::OBJECT];
        match self.normalize() {
            ObjectKind::Object => {}
            ObjectKind::Mechanism => layers.push(layout::MECHANISM),
            ObjectKind::HardwareFeature(feature) => {
                layers.push(layout::HW_FEATURE);
                layers.extend(feature.map(layout::hardware_feature));
            }
            ObjectKind::Data => layers.extend([layout::STORAGE, layout::DATA]),
            ObjectKind::Certificate(certificate_type) => {
                layers.extend([layout::STORAGE, layout::CERTIFICATE]);
                layers.extend(certificate_type.map(layout::certificate));
            }
            ObjectKind::PublicKey(key_type) => {
                layers.extend([layout::STORAGE, layout::KEY, layout::PUBLIC_KEY]);
                layers.extend(key_type.and_then(layout::public_key));
            }
            ObjectKind::PrivateKey(key_type) => {
                layers.extend([layout::STORAGE, layout::KEY, layout::PRIVATE_KEY]);
                layers.extend(key_type.and_then(layout::private_key));
            }
            ObjectKind::SecretKey(key_type) => {
                layers.extend([layout::STORAGE, layout::KEY, layout::SECRET_KEY]);
                layers.extend(key_type.and_then(layout::secret_key));
            }
            ObjectKind::DomainParameters(key_type) => {
                layers.extend([layout::STORAGE, layout::DOMAIN_PARAMETERS]);
                layers.extend(key_type.and_then(layout::domain_parameters));
            }
        }
        layers
    }

    /// Discriminator slots fixed by this kind, with their values.
    pub fn discriminators(self) -> Vec<(AttributeType, CK_ULONG)> {
        let kind = self.normalize();
        let mut fixed = Vec::with_capacity(2);
        if let Some(class) = kind.class() {
            fixed.push((CKA_CLASS, class.code()));
        }
        let sub_type = match kind {
            ObjectKind::Certificate(Some(t)) => Some((CertificateType::ATTRIBUTE, t.code())),
            ObjectKind::PublicKey(Some(k))
            | ObjectKind::PrivateKey(Some(k))
            | ObjectKind::SecretKey(Some(k))
            | ObjectKind::DomainParameters(Some(k)) => Some((KeyType::ATTRIBUTE, k.code())),
            ObjectKind::HardwareFeature(Some(h)) => {
                Some((HardwareFeatureType::ATTRIBUTE, h.code()))
            }
            _ => None,
        };
        fixed.extend(sub_type);
        fixed
    }

    pub fn is_fixed(self, attribute_type: AttributeType) -> bool {
        self.discriminators()
            .iter()
            .any(|(fixed, _)| *fixed == attribute_type)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn with_sub<T: fmt::Display>(
            f: &mut fmt::Formatter<'_>,
            sub: Option<T>,
            family: &str,
        ) -> fmt::Result {
            match sub {
                Some(sub) => write!(f, "{sub} {family}"),
                None => f.write_str(family),
            }
        }

        match *self {
            ObjectKind::Object => f.write_str("Object"),
            ObjectKind::Data => f.write_str("Data"),
            ObjectKind::Mechanism => f.write_str("Mechanism"),
            ObjectKind::Certificate(t) => with_sub(f, t, "Certificate"),
            ObjectKind::PublicKey(k) => with_sub(f, k, "Public Key"),
            ObjectKind::PrivateKey(k) => with_sub(f, k, "Private Key"),
            ObjectKind::SecretKey(k) => with_sub(f, k, "Secret Key"),
            ObjectKind::DomainParameters(k) => with_sub(f, k, "Domain Parameters"),
            ObjectKind::HardwareFeature(Some(h)) => write!(f, "{h}"),
            ObjectKind::HardwareFeature(None) => f.write_str("Hardware Feature"),
        }
    }
}

/// Handle, kind and attribute slots shared by every typed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCore {
    handle: Option<ObjectHandle>,
    kind: ObjectKind,
    attributes: AttributeSet,
}

impl ObjectCore {
    pub fn new(kind: ObjectKind) -> Self {
        let mut core = Self {
            handle: None,
            kind: kind.normalize(),
            attributes: AttributeSet::new(),
        };
        core.allocate_attributes();
        core.set_discriminators();
        core
    }

    /// Allocate every slot of the kind's layers. Existing slots and their
    /// values are left alone, so calling this again is a no-op.
    pub fn allocate_attributes(&mut self) {
        for layer in self.kind.layers() {
            for attribute_type in layer {
                self.attributes.allocate(*attribute_type);
            }
        }
    }

    /// Write the class and sub-type values implied by the kind.
    pub fn set_discriminators(&mut self) {
        for (attribute_type, code) in self.kind.discriminators() {
            self.attributes
                .add_attribute(Attribute::discriminator(attribute_type, code));
        }
    }

    /// Allocate an extra slot outside the kind's layout.
    pub fn allocate_slot(&mut self, attribute_type: AttributeType, kind: ValueKind) {
        self.attributes.allocate_with_kind(attribute_type, kind);
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn handle(&self) -> Option<ObjectHandle> {
        self.handle
    }

    pub fn set_handle(&mut self, handle: ObjectHandle) {
        self.handle = Some(handle);
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }

    pub fn is_fixed(&self, attribute_type: AttributeType) -> bool {
        self.kind.is_fixed(attribute_type)
    }

    fn writable_slot(&mut self, attribute_type: AttributeType) -> ObjectResult<&mut Attribute> {
        let object = self.kind.to_string();
        if self.kind.is_fixed(attribute_type) {
            return Err(ObjectError::FixedDiscriminator {
                attribute: attribute_type,
                object,
            });
        }
        self.attributes
            .get_mut(attribute_type)
            .ok_or(ObjectError::UnsupportedAttribute {
                attribute: attribute_type,
                object,
            })
    }
}

/// Common behaviour of every typed object.
pub trait TypedObject {
    fn core(&self) -> &ObjectCore;
    fn core_mut(&mut self) -> &mut ObjectCore;

    fn kind(&self) -> ObjectKind {
        self.core().kind()
    }

    fn handle(&self) -> Option<ObjectHandle> {
        self.core().handle()
    }

    fn attributes(&self) -> &AttributeSet {
        self.core().attributes()
    }

    fn attribute(&self, attribute_type: AttributeType) -> Option<&Attribute> {
        self.attributes().get(attribute_type)
    }

    /// Raw `CKA_CLASS` value, if present.
    fn class(&self) -> Option<CK_ULONG> {
        self.attribute(CKA_CLASS).and_then(Attribute::ulong_value)
    }

    /// Set a slot this object allocates. Fixed discriminators cannot be
    /// changed.
    fn set_attribute(
        &mut self,
        attribute_type: AttributeType,
        value: impl Into<TypedValue>,
    ) -> ObjectResult<()> {
        self.core_mut().writable_slot(attribute_type)?.set_value(value)
    }

    /// Mark a slot not present. The slot itself stays allocated.
    fn remove_attribute(&mut self, attribute_type: AttributeType) -> ObjectResult<()> {
        self.core_mut().writable_slot(attribute_type)?.mark_absent();
        Ok(())
    }

    /// Template holding the present slots, ready for object creation or
    /// search.
    fn build_template(&self) -> AttributeSet {
        self.attributes().present_subset()
    }

    fn to_transfer_list(&self) -> Vec<RawRecord> {
        self.attributes().to_transfer_list()
    }
}

object_enum! {
    /// Any object the resolver can produce.
    pub enum TokenObject {
        Object(BaseObject),
        Data(Data),
        Mechanism(MechanismObject),
        Certificate(Certificate),
        PublicKey(PublicKey),
        PrivateKey(PrivateKey),
        SecretKey(SecretKey),
        DomainParameters(DomainParameters),
        HardwareFeature(HardwareFeature),
        Vendor(VendorObject),
    }
    impl [];
}

impl TokenObject {
    /// Empty object of `kind`, slots allocated and discriminators set.
    pub fn new(kind: ObjectKind) -> Self {
        match kind.normalize() {
            ObjectKind::Object => BaseObject::new().into(),
            ObjectKind::Data => Data::new().into(),
            ObjectKind::Mechanism => MechanismObject::new().into(),
            ObjectKind::Certificate(t) => Certificate::new(t).into(),
            ObjectKind::PublicKey(k) => PublicKey::new(k).into(),
            ObjectKind::PrivateKey(k) => PrivateKey::new(k).into(),
            ObjectKind::SecretKey(k) => SecretKey::new(k).into(),
            ObjectKind::DomainParameters(k) => DomainParameters::new(k).into(),
            ObjectKind::HardwareFeature(h) => HardwareFeature::new(h).into(),
        }
    }

    pub fn is_vendor(&self) -> bool {
        matches!(self, TokenObject::Vendor(_))
    }

    pub fn as_data(&self) -> Option<&Data> {
        match self {
            TokenObject::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_certificate(&self) -> Option<&Certificate> {
        match self {
            TokenObject::Certificate(certificate) => Some(certificate),
            _ => None,
        }
    }

    pub fn as_public_key(&self) -> Option<&PublicKey> {
        match self {
            TokenObject::PublicKey(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_private_key(&self) -> Option<&PrivateKey> {
        match self {
            TokenObject::PrivateKey(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_secret_key(&self) -> Option<&SecretKey> {
        match self {
            TokenObject::SecretKey(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_domain_parameters(&self) -> Option<&DomainParameters> {
        match self {
            TokenObject::DomainParameters(params) => Some(params),
            _ => None,
        }
    }

    pub fn as_hardware_feature(&self) -> Option<&HardwareFeature> {
        match self {
            TokenObject::HardwareFeature(feature) => Some(feature),
            _ => None,
        }
    }

    pub fn as_vendor(&self) -> Option<&VendorObject> {
        match self {
            TokenObject::Vendor(object) => Some(object),
            _ => None,
        }
    }

    pub fn into_public_key(self) -> Option<PublicKey> {
        match self {
            TokenObject::PublicKey(key) => Some(key),
            _ => None,
        }
    }

    pub fn into_private_key(self) -> Option<PrivateKey> {
        match self {
            TokenObject::PrivateKey(key) => Some(key),
            _ => None,
        }
    }

    pub fn into_secret_key(self) -> Option<SecretKey> {
        match self {
            TokenObject::SecretKey(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for TokenObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.handle() {
            Some(handle) => writeln!(f, "{} (handle {handle})", self.kind())?,
            None => writeln!(f, "{}", self.kind())?,
        }
        for attribute in self.attributes() {
            writeln!(f, "  {attribute}")?;
        }
        Ok(())
    }
}
