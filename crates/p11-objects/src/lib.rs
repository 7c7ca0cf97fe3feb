//! Typed PKCS#11 objects.
//!
//! Attributes are tagged values with presence and sensitivity flags,
//! grouped into [`AttributeSet`] templates. Token objects are typed by their
//! class and sub-type discriminators; [`ObjectResolver`] reads a handle
//! through an [`AttributeReader`] and builds the matching [`TokenObject`].

pub mod attribute;
pub mod config;
pub mod error;
pub mod mechanism;
pub mod object;
pub mod registry;
pub mod resolver;
pub mod template;
pub mod token;
pub mod transport;
pub mod types;
pub mod value;

pub use attribute::{Attribute, RawPayload, RawRecord, attribute_name, kind_of};
pub use config::ResolverConfig;
pub use error::{ObjectError, ObjectResult, ReadFault, TransportFault};
pub use object::{KeyPair, ObjectCore, ObjectKind, TokenObject, TypedObject};
pub use registry::{VendorBuilder, VendorRegistry};
pub use resolver::ObjectResolver;
pub use template::{AttributeSet, GenericTemplate};
pub use token::{MemoryToken, ReadStats};
pub use transport::AttributeReader;
pub use types::{
    AttributeType, CertificateType, Discriminant, Discriminator, HardwareFeatureType, KeyType,
    MechanismType, ObjectClass, ObjectFamily, ObjectHandle,
};
pub use value::{TypedValue, ValueKind};
