//! In-process token.
//!
//! [`MemoryToken`] stores objects as raw attribute records and serves them
//! through [`AttributeReader`]. Besides backing software tokens it can mark
//! attributes sensitive, inject transport faults and count reads, which is
//! what resolution tests need.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use cryptoki_sys::{CKR_FUNCTION_FAILED, CKR_OBJECT_HANDLE_INVALID};
use parking_lot::RwLock;

use crate::attribute::{Attribute, RawPayload, RawRecord};
use crate::error::{ObjectResult, ReadFault, TransportFault};
use crate::template::AttributeSet;
use crate::transport::AttributeReader;
use crate::types::{AttributeType, ObjectHandle};

#[derive(Clone, Debug)]
enum StoredValue {
    Value(RawPayload),
    Sensitive,
}

#[derive(Clone, Debug, Default)]
struct StoredObject {
    attributes: HashMap<AttributeType, StoredValue>,
}

impl StoredObject {
    fn from_records(records: impl IntoIterator<Item = RawRecord>) -> Self {
        let attributes = records
            .into_iter()
            .map(|record| {
                let value = if record.sensitive {
                    StoredValue::Sensitive
                } else {
                    StoredValue::Value(record.payload)
                };
                (record.attribute_type, value)
            })
            .collect();
        Self { attributes }
    }

    fn to_attribute_set(&self) -> AttributeSet {
        let mut set = AttributeSet::new();
        for (attribute_type, value) in &self.attributes {
            let attribute = match value {
                StoredValue::Sensitive => {
                    let mut attribute = Attribute::new(*attribute_type);
                    attribute.mark_sensitive();
                    attribute
                }
                StoredValue::Value(payload) => {
                    let record = RawRecord::new(*attribute_type, payload.clone());
                    Attribute::from_transfer_record(&record)
                        .unwrap_or_else(|_| Attribute::unrecognized(&record))
                }
            };
            set.add_attribute(attribute);
        }
        set
    }
}

/// Number of reads served, split by call shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadStats {
    pub single: usize,
    pub batch: usize,
}

pub struct MemoryToken {
    objects: RwLock<HashMap<ObjectHandle, StoredObject>>,
    faults: RwLock<HashMap<(ObjectHandle, AttributeType), TransportFault>>,
    next_object: AtomicU64,
    fail_batches: AtomicBool,
    single_reads: AtomicUsize,
    batch_reads: AtomicUsize,
}

impl Default for MemoryToken {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryToken {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            faults: RwLock::new(HashMap::new()),
            next_object: AtomicU64::new(1),
            fail_batches: AtomicBool::new(false),
            single_reads: AtomicUsize::new(0),
            batch_reads: AtomicUsize::new(0),
        }
    }

    /// Store the present attributes of `template` as a new object.
    /// Sensitive attributes are stored without a readable value.
    pub fn create_object(&self, template: &AttributeSet) -> ObjectHandle {
        self.create_from_records(template.to_transfer_list())
    }

    pub fn create_from_records(
        &self,
        records: impl IntoIterator<Item = RawRecord>,
    ) -> ObjectHandle {
        let handle = self.next_object.fetch_add(1, Ordering::Relaxed) as ObjectHandle;
        self.objects
            .write()
            .insert(handle, StoredObject::from_records(records));
        handle
    }

    pub fn destroy_object(&self, handle: ObjectHandle) -> ObjectResult<()> {
        self.objects
            .write()
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| handle_invalid(handle).into())
    }

    /// Insert or replace one attribute record of an object.
    pub fn set_record(&self, handle: ObjectHandle, record: RawRecord) -> ObjectResult<()> {
        let mut objects = self.objects.write();
        let object = objects.get_mut(&handle).ok_or_else(|| handle_invalid(handle))?;
        let value = if record.sensitive {
            StoredValue::Sensitive
        } else {
            StoredValue::Value(record.payload)
        };
        object.attributes.insert(record.attribute_type, value);
        Ok(())
    }

    /// Keep the attribute but refuse to reveal its value.
    pub fn mark_sensitive(
        &self,
        handle: ObjectHandle,
        attribute_type: AttributeType,
    ) -> ObjectResult<()> {
        self.set_record(handle, RawRecord::sensitive(attribute_type))
    }

    pub fn remove_attribute(
        &self,
        handle: ObjectHandle,
        attribute_type: AttributeType,
    ) -> ObjectResult<()> {
        let mut objects = self.objects.write();
        let object = objects.get_mut(&handle).ok_or_else(|| handle_invalid(handle))?;
        object.attributes.remove(&attribute_type);
        Ok(())
    }

    /// Make every read of `attribute_type` on `handle` fail with `fault`.
    pub fn inject_fault(
        &self,
        handle: ObjectHandle,
        attribute_type: AttributeType,
        fault: TransportFault,
    ) {
        self.faults.write().insert((handle, attribute_type), fault);
    }

    pub fn clear_faults(&self) {
        self.faults.write().clear();
    }

    /// Reject every batch read with `CKR_FUNCTION_FAILED`.
    pub fn fail_batch_reads(&self, fail: bool) {
        self.fail_batches.store(fail, Ordering::Relaxed);
    }

    /// Handles of objects matching `template`, in ascending order.
    pub fn find_objects(&self, template: &AttributeSet) -> Vec<ObjectHandle> {
        let objects = self.objects.read();
        let mut handles: Vec<ObjectHandle> = objects
            .iter()
            .filter(|(_, object)| template.matches(&object.to_attribute_set()))
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort_unstable();
        handles
    }

    /// Attribute set of an object as stored, without going through reads.
    pub fn snapshot(&self, handle: ObjectHandle) -> Option<AttributeSet> {
        self.objects
            .read()
            .get(&handle)
            .map(StoredObject::to_attribute_set)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    pub fn read_stats(&self) -> ReadStats {
        ReadStats {
            single: self.single_reads.load(Ordering::Relaxed),
            batch: self.batch_reads.load(Ordering::Relaxed),
        }
    }

    pub fn reset_read_stats(&self) {
        self.single_reads.store(0, Ordering::Relaxed);
        self.batch_reads.store(0, Ordering::Relaxed);
    }

    fn lookup(
        &self,
        objects: &HashMap<ObjectHandle, StoredObject>,
        handle: ObjectHandle,
        attribute_type: AttributeType,
    ) -> Result<RawRecord, ReadFault> {
        if let Some(fault) = self.faults.read().get(&(handle, attribute_type)) {
            return Err(ReadFault::Transport(fault.clone()));
        }
        let object = objects.get(&handle).ok_or_else(|| handle_invalid(handle))?;
        match object.attributes.get(&attribute_type) {
            None => Err(ReadFault::TypeInvalid),
            Some(StoredValue::Sensitive) => Err(ReadFault::Sensitive),
            Some(StoredValue::Value(payload)) => {
                Ok(RawRecord::new(attribute_type, payload.clone()))
            }
        }
    }
}

impl AttributeReader for MemoryToken {
    fn read_attribute(
        &self,
        handle: ObjectHandle,
        attribute_type: AttributeType,
    ) -> Result<RawRecord, ReadFault> {
        self.single_reads.fetch_add(1, Ordering::Relaxed);
        let objects = self.objects.read();
        self.lookup(&objects, handle, attribute_type)
    }

    fn read_attributes(
        &self,
        handle: ObjectHandle,
        attribute_types: &[AttributeType],
    ) -> Result<Vec<RawRecord>, ReadFault> {
        self.batch_reads.fetch_add(1, Ordering::Relaxed);
        if self.fail_batches.load(Ordering::Relaxed) {
            return Err(ReadFault::Transport(TransportFault::new(
                CKR_FUNCTION_FAILED,
                "batch read rejected",
            )));
        }
        let objects = self.objects.read();
        attribute_types
            .iter()
            .map(|attribute_type| self.lookup(&objects, handle, *attribute_type))
            .collect()
    }
}

fn handle_invalid(handle: ObjectHandle) -> TransportFault {
    TransportFault::new(
        CKR_OBJECT_HANDLE_INVALID,
        format!("object handle {handle} does not exist"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoki_sys::{CKA_CLASS, CKA_ID, CKA_LABEL, CKA_VALUE, CKO_DATA, CKR_DEVICE_ERROR};

    fn data_object(token: &MemoryToken, label: &str) -> ObjectHandle {
        let template = AttributeSet::new()
            .with(CKA_CLASS, CKO_DATA)
            .and_then(|set| set.with(CKA_LABEL, label))
            .and_then(|set| set.with(CKA_VALUE, vec![1u8, 2, 3]))
            .expect("template");
        token.create_object(&template)
    }

    #[test]
    fn reads_report_missing_and_sensitive_attributes() {
        let token = MemoryToken::new();
        let handle = data_object(&token, "blob");
        token.mark_sensitive(handle, CKA_VALUE).expect("mark");

        assert_eq!(
            token.read_attribute(handle, CKA_LABEL),
            Ok(RawRecord::bytes(CKA_LABEL, b"blob".to_vec()))
        );
        assert_eq!(token.read_attribute(handle, CKA_ID), Err(ReadFault::TypeInvalid));
        assert_eq!(token.read_attribute(handle, CKA_VALUE), Err(ReadFault::Sensitive));
    }

    #[test]
    fn batch_read_fails_as_a_whole() {
        let token = MemoryToken::new();
        let handle = data_object(&token, "blob");
        let records = token
            .read_attributes(handle, &[CKA_CLASS, CKA_LABEL])
            .expect("batch succeeds");
        assert_eq!(records.len(), 2);
        assert_eq!(
            token.read_attributes(handle, &[CKA_CLASS, CKA_ID]),
            Err(ReadFault::TypeInvalid)
        );
        assert_eq!(token.read_stats(), ReadStats { single: 0, batch: 2 });
    }

    #[test]
    fn unknown_handle_is_a_transport_fault() {
        let token = MemoryToken::new();
        let fault = token.read_attribute(42, CKA_CLASS).unwrap_err();
        assert!(fault.is_transport());
        assert!(token.destroy_object(42).is_err());
    }

    #[test]
    fn injected_faults_and_batch_rejection() {
        let token = MemoryToken::new();
        let handle = data_object(&token, "blob");
        token.inject_fault(handle, CKA_LABEL, TransportFault::new(CKR_DEVICE_ERROR, "gone"));
        assert!(token.read_attribute(handle, CKA_LABEL).unwrap_err().is_transport());
        token.clear_faults();
        assert!(token.read_attribute(handle, CKA_LABEL).is_ok());

        token.fail_batch_reads(true);
        assert!(token.read_attributes(handle, &[CKA_CLASS]).is_err());
        token.fail_batch_reads(false);
        assert!(token.read_attributes(handle, &[CKA_CLASS]).is_ok());
    }

    #[test]
    fn find_objects_filters_by_template() {
        let token = MemoryToken::new();
        let first = data_object(&token, "alpha");
        let _second = data_object(&token, "beta");

        let filter = AttributeSet::new().with(CKA_LABEL, "alpha").expect("filter");
        assert_eq!(token.find_objects(&filter), vec![first]);
        assert_eq!(token.find_objects(&AttributeSet::new()).len(), 2);

        token.destroy_object(first).expect("destroy");
        assert!(token.find_objects(&filter).is_empty());
        assert_eq!(token.len(), 1);
    }

    #[test]
    fn snapshot_hides_sensitive_values() {
        let token = MemoryToken::new();
        let handle = data_object(&token, "blob");
        token.mark_sensitive(handle, CKA_VALUE).expect("mark");
        let snapshot = token.snapshot(handle).expect("object");
        let value = snapshot.get(CKA_VALUE).expect("slot");
        assert!(value.sensitive());
        assert!(value.value().is_none());
    }
}
