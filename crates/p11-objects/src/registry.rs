//! Application supplied builders for objects the resolver cannot type.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::error::{ObjectError, ObjectResult};
use crate::object::TokenObject;
use crate::resolver::ObjectResolver;
use crate::types::{ObjectFamily, ObjectHandle};

/// Builds an object for a handle whose class or sub-type has no typed
/// layout. Returning [`ObjectError::UnresolvedDiscriminator`] declines the
/// handle; the resolver then builds the family base object.
///
/// Calling [`ObjectResolver::resolve_object`] on the same handle from inside
/// the builder does not reach the builder again; it yields the base object.
pub type VendorBuilder =
    Arc<dyn Fn(&ObjectResolver<'_>, ObjectHandle) -> ObjectResult<TokenObject> + Send + Sync>;

static GLOBAL_REGISTRY: Lazy<VendorRegistry> = Lazy::new(VendorRegistry::new);

/// One write-once builder slot per [`ObjectFamily`].
#[derive(Default)]
pub struct VendorRegistry {
    builders: [OnceCell<VendorBuilder>; 5],
}

impl VendorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by [`ObjectResolver::new`].
    pub fn global() -> &'static VendorRegistry {
        &GLOBAL_REGISTRY
    }

    /// Install the builder for `family`. The first registration wins.
    pub fn register<F>(&self, family: ObjectFamily, builder: F) -> ObjectResult<()>
    where
        F: Fn(&ObjectResolver<'_>, ObjectHandle) -> ObjectResult<TokenObject>
            + Send
            + Sync
            + 'static,
    {
        self.builders[family.index()]
            .set(Arc::new(builder))
            .map_err(|_| ObjectError::AlreadyRegistered(family))?;
        debug!(?family, "registered vendor object builder");
        Ok(())
    }

    pub fn builder(&self, family: ObjectFamily) -> Option<VendorBuilder> {
        self.builders[family.index()].get().cloned()
    }

    pub fn is_registered(&self, family: ObjectFamily) -> bool {
        self.builders[family.index()].get().is_some()
    }
}

impl fmt::Debug for VendorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<ObjectFamily> = ObjectFamily::ALL
            .into_iter()
            .filter(|family| self.is_registered(*family))
            .collect();
        f.debug_struct("VendorRegistry")
            .field("registered", &registered)
            .finish()
    }
}
