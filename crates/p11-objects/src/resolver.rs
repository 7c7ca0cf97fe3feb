//! Turns token object handles into typed objects.
//!
//! Resolution reads `CKA_CLASS`, then the family sub-type (`CKA_KEY_TYPE`,
//! `CKA_CERTIFICATE_TYPE` or `CKA_HW_FEATURE_TYPE`), allocates the matching
//! object and fills its slots. Values without a typed layout go to the
//! vendor builder of the family, then to the family base object.

use cryptoki_sys::CK_ULONG;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::attribute::{RawRecord, attribute_name};
use crate::config::ResolverConfig;
use crate::error::{ObjectError, ObjectResult, ReadFault};
use crate::object::{ObjectKind, TokenObject, TypedObject};
use crate::registry::VendorRegistry;
use crate::template::AttributeSet;
use crate::transport::AttributeReader;
use crate::types::{
    AttributeType, CertificateType, Discriminant, Discriminator, HardwareFeatureType, KeyType,
    ObjectClass, ObjectHandle,
};
use crate::value::{TypedValue, ValueKind};

pub struct ObjectResolver<'a> {
    reader: &'a dyn AttributeReader,
    registry: &'a VendorRegistry,
    config: ResolverConfig,
    // handles currently inside a vendor builder
    building: Mutex<Vec<ObjectHandle>>,
}

impl<'a> ObjectResolver<'a> {
    /// Resolver over `reader` using the process-wide vendor registry.
    pub fn new(reader: &'a dyn AttributeReader) -> Self {
        Self {
            reader,
            registry: VendorRegistry::global(),
            config: ResolverConfig::default(),
            building: Mutex::new(Vec::new()),
        }
    }

    pub fn with_registry(mut self, registry: &'a VendorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reader(&self) -> &'a dyn AttributeReader {
        self.reader
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Read `handle` into the most specific typed object available.
    ///
    /// Absent, sensitive or unknown attributes never fail resolution; only
    /// transport faults (and decode errors under `strict_decoding`) do.
    pub fn resolve_object(&self, handle: ObjectHandle) -> ObjectResult<TokenObject> {
        let class = self.read_discriminator::<ObjectClass>(handle)?;
        debug!(handle, ?class, "resolving object");
        match class {
            Discriminator::Known(ObjectClass::Data) => self.materialize(ObjectKind::Data, handle),
            Discriminator::Known(ObjectClass::Mechanism) => {
                self.materialize(ObjectKind::Mechanism, handle)
            }
            Discriminator::Known(ObjectClass::Certificate) => {
                self.resolve_sub_type::<CertificateType>(handle, ObjectKind::Certificate)
            }
            Discriminator::Known(ObjectClass::PublicKey) => {
                self.resolve_sub_type::<KeyType>(handle, ObjectKind::PublicKey)
            }
            Discriminator::Known(ObjectClass::PrivateKey) => {
                self.resolve_sub_type::<KeyType>(handle, ObjectKind::PrivateKey)
            }
            Discriminator::Known(ObjectClass::SecretKey) => {
                self.resolve_sub_type::<KeyType>(handle, ObjectKind::SecretKey)
            }
            Discriminator::Known(ObjectClass::DomainParameters) => {
                self.resolve_sub_type::<KeyType>(handle, ObjectKind::DomainParameters)
            }
            Discriminator::Known(ObjectClass::HardwareFeature) => {
                self.resolve_sub_type::<HardwareFeatureType>(handle, ObjectKind::HardwareFeature)
            }
            other => self.fallback(ObjectKind::Object, other.raw(), handle),
        }
    }

    /// Fill every slot of `template` from the token. Slots keep their value
    /// kinds; the set gains no new slots.
    pub fn fill_template(
        &self,
        handle: ObjectHandle,
        template: &mut AttributeSet,
    ) -> ObjectResult<()> {
        self.fill_slots(handle, template, &[])
    }

    /// Fill the non-fixed slots of `object` from the token and bind it to
    /// `handle`.
    pub fn fill_object<O>(&self, handle: ObjectHandle, object: &mut O) -> ObjectResult<()>
    where
        O: TypedObject,
    {
        let core = object.core_mut();
        core.set_handle(handle);
        let fixed: Vec<AttributeType> = core
            .kind()
            .discriminators()
            .into_iter()
            .map(|(attribute_type, _)| attribute_type)
            .collect();
        self.fill_slots(handle, core.attributes_mut(), &fixed)
    }

    /// Allocate an object of `kind` and fill it from `handle`.
    pub fn materialize(&self, kind: ObjectKind, handle: ObjectHandle) -> ObjectResult<TokenObject> {
        let mut object = TokenObject::new(kind);
        self.fill_object(handle, &mut object)?;
        Ok(object)
    }

    /// Read a class or sub-type value. Absent and sensitive values read as
    /// [`Discriminator::Absent`].
    pub fn read_discriminator<T: Discriminant>(
        &self,
        handle: ObjectHandle,
    ) -> ObjectResult<Discriminator<T>> {
        let value = match self.reader.read_attribute(handle, T::ATTRIBUTE) {
            Ok(record) if record.sensitive => None,
            Ok(record) => self.decode_discriminator(handle, &record)?,
            Err(ReadFault::TypeInvalid | ReadFault::Sensitive) => None,
            Err(ReadFault::Transport(fault)) => return Err(fault.into()),
        };
        Ok(Discriminator::classify(value))
    }

    fn decode_discriminator(
        &self,
        handle: ObjectHandle,
        record: &RawRecord,
    ) -> ObjectResult<Option<CK_ULONG>> {
        match TypedValue::decode(record.attribute_type, ValueKind::Ulong, &record.payload) {
            Ok(value) => Ok(value.and_then(|value| value.as_ulong())),
            Err(err) if self.config.strict_decoding => Err(err),
            Err(err) => {
                warn!(
                    handle,
                    attribute = %attribute_name(record.attribute_type),
                    error = %err,
                    "treating undecodable discriminator as absent"
                );
                Ok(None)
            }
        }
    }

    fn resolve_sub_type<T: Discriminant>(
        &self,
        handle: ObjectHandle,
        kind_of: fn(Option<T>) -> ObjectKind,
    ) -> ObjectResult<TokenObject> {
        let sub_type = self.read_discriminator::<T>(handle)?;
        let kind = kind_of(sub_type.known()).normalize();
        if kind != kind.base_kind() {
            debug!(handle, %kind, "resolved typed object");
            return self.materialize(kind, handle);
        }
        self.fallback(kind, sub_type.raw(), handle)
    }

    /// Vendor builder of the family if one is registered and accepts the
    /// handle, otherwise the family base object.
    ///
    /// Builder transport faults propagate rather than falling back. A handle
    /// re-dispatched from inside its own builder skips the builder and gets
    /// the base object.
    fn fallback(
        &self,
        kind: ObjectKind,
        discriminator: Option<CK_ULONG>,
        handle: ObjectHandle,
    ) -> ObjectResult<TokenObject> {
        let family = kind.family();
        if let Some(builder) = self.registry.builder(family) {
            if self.building.lock().contains(&handle) {
                debug!(handle, ?family, "handle re-dispatched by its vendor builder");
            } else {
                debug!(handle, ?family, ?discriminator, "trying vendor object builder");
                self.building.lock().push(handle);
                let built = builder(self, handle);
                self.building.lock().retain(|h| *h != handle);
                match built {
                    Ok(object) => return Ok(object),
                    Err(ObjectError::Transport(fault)) => return Err(fault.into()),
                    Err(ObjectError::UnresolvedDiscriminator { .. }) => {
                        debug!(handle, ?family, "vendor builder declined");
                    }
                    Err(err) => {
                        warn!(handle, ?family, error = %err, "vendor builder failed");
                    }
                }
            }
        }
        debug!(handle, %kind, ?discriminator, "using base object");
        self.materialize(kind.base_kind(), handle)
    }

    fn fill_slots(
        &self,
        handle: ObjectHandle,
        slots: &mut AttributeSet,
        skip: &[AttributeType],
    ) -> ObjectResult<()> {
        let mut scalars = Vec::new();
        let mut individual = Vec::new();
        for attribute in slots.iter() {
            let attribute_type = attribute.attribute_type();
            if skip.contains(&attribute_type) {
                continue;
            }
            if self.config.read_arrays_individually && attribute.kind().is_array() {
                individual.push(attribute_type);
            } else {
                scalars.push(attribute_type);
            }
        }

        if self.config.batch_reads && !scalars.is_empty() {
            match self.read_batch(handle, &scalars) {
                Some(records) => {
                    for record in records {
                        let attribute_type = record.attribute_type;
                        self.apply(handle, slots, attribute_type, Ok(record))?;
                    }
                }
                None => individual.append(&mut scalars),
            }
        } else {
            individual.append(&mut scalars);
        }

        for attribute_type in individual {
            let outcome = self.reader.read_attribute(handle, attribute_type);
            self.apply(handle, slots, attribute_type, outcome)?;
        }
        Ok(())
    }

    /// One batch read; `None` asks the caller to retry attribute by attribute.
    fn read_batch(
        &self,
        handle: ObjectHandle,
        attribute_types: &[AttributeType],
    ) -> Option<Vec<RawRecord>> {
        match self.reader.read_attributes(handle, attribute_types) {
            Ok(records)
                if records.len() == attribute_types.len()
                    && records
                        .iter()
                        .zip(attribute_types)
                        .all(|(record, requested)| record.attribute_type == *requested) =>
            {
                Some(records)
            }
            Ok(records) => {
                trace!(
                    handle,
                    requested = attribute_types.len(),
                    returned = records.len(),
                    "batch read returned mismatched records, retrying individually"
                );
                None
            }
            Err(fault) => {
                trace!(handle, %fault, "batch read failed, retrying individually");
                None
            }
        }
    }

    fn apply(
        &self,
        handle: ObjectHandle,
        slots: &mut AttributeSet,
        attribute_type: AttributeType,
        outcome: Result<RawRecord, ReadFault>,
    ) -> ObjectResult<()> {
        let Some(slot) = slots.get_mut(attribute_type) else {
            return Ok(());
        };
        match slot.apply_read(outcome) {
            Ok(()) => Ok(()),
            Err(err @ ObjectError::Transport(_)) => Err(err),
            Err(err) if self.config.strict_decoding => Err(err),
            Err(err) => {
                warn!(
                    handle,
                    attribute = %attribute_name(attribute_type),
                    error = %err,
                    "dropping undecodable attribute"
                );
                slot.mark_absent();
                Ok(())
            }
        }
    }
}
