//! Attribute sets and generic templates.
//!
//! Every typed object owns one [`AttributeSet`] holding all of its slots. The
//! same type doubles as the free-form template used for object search,
//! creation and key derivation.

use std::collections::BTreeMap;

use tracing::warn;

use crate::attribute::{Attribute, RawRecord};
use crate::error::{ObjectError, ObjectResult};
use crate::types::AttributeType;
use crate::value::{TypedValue, ValueKind};

/// Type-keyed attribute collection. Iteration is in ascending type order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet {
    attributes: BTreeMap<AttributeType, Attribute>,
}

/// A template is an attribute set that is not bound to a token object.
pub type GenericTemplate = AttributeSet;

impl AttributeSet {
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
        }
    }

    /// Set with an empty slot for each of `types`.
    pub fn with_slots(types: &[AttributeType]) -> Self {
        let mut set = Self::new();
        for attribute_type in types {
            set.allocate(*attribute_type);
        }
        set
    }

    /// Register an empty slot, keeping an existing one untouched.
    pub fn allocate(&mut self, attribute_type: AttributeType) -> &mut Attribute {
        self.attributes
            .entry(attribute_type)
            .or_insert_with(|| Attribute::new(attribute_type))
    }

    pub fn allocate_with_kind(
        &mut self,
        attribute_type: AttributeType,
        kind: ValueKind,
    ) -> &mut Attribute {
        self.attributes
            .entry(attribute_type)
            .or_insert_with(|| Attribute::with_kind(attribute_type, kind))
    }

    /// Insert `attribute`, replacing any attribute of the same type.
    pub fn add_attribute(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.attributes.insert(attribute.attribute_type(), attribute)
    }

    pub fn remove_attribute(&mut self, attribute_type: AttributeType) -> Option<Attribute> {
        self.attributes.remove(&attribute_type)
    }

    pub fn get(&self, attribute_type: AttributeType) -> Option<&Attribute> {
        self.attributes.get(&attribute_type)
    }

    pub fn get_mut(&mut self, attribute_type: AttributeType) -> Option<&mut Attribute> {
        self.attributes.get_mut(&attribute_type)
    }

    /// True if an attribute of the same type exists; values are not compared.
    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.contains_type(attribute.attribute_type())
    }

    pub fn contains_type(&self, attribute_type: AttributeType) -> bool {
        self.attributes.contains_key(&attribute_type)
    }

    /// Set the value of an existing slot.
    pub fn set_value(
        &mut self,
        attribute_type: AttributeType,
        value: impl Into<TypedValue>,
    ) -> ObjectResult<()> {
        match self.attributes.get_mut(&attribute_type) {
            Some(attribute) => attribute.set_value(value),
            None => Err(ObjectError::UnsupportedAttribute {
                attribute: attribute_type,
                object: "attribute set".to_string(),
            }),
        }
    }

    /// Allocate the slot if needed and set its value.
    pub fn insert_value(
        &mut self,
        attribute_type: AttributeType,
        value: impl Into<TypedValue>,
    ) -> ObjectResult<()> {
        self.allocate(attribute_type).set_value(value)
    }

    /// Builder form of [`AttributeSet::insert_value`].
    pub fn with(
        mut self,
        attribute_type: AttributeType,
        value: impl Into<TypedValue>,
    ) -> ObjectResult<Self> {
        self.insert_value(attribute_type, value)?;
        Ok(self)
    }

    /// Copy every attribute of `other`, overwriting on type collision.
    pub fn union_all(&mut self, other: &AttributeSet) {
        for attribute in other.iter() {
            self.add_attribute(attribute.clone());
        }
    }

    /// Copy only the present attributes of `other`.
    pub fn union_present(&mut self, other: &AttributeSet) {
        for attribute in other.iter().filter(|a| a.present()) {
            self.add_attribute(attribute.clone());
        }
    }

    /// Remove every type that `other` contains.
    pub fn subtract_all(&mut self, other: &AttributeSet) {
        for attribute_type in other.types() {
            self.attributes.remove(&attribute_type);
        }
    }

    /// Remove every type that is present in `other`.
    pub fn subtract_present(&mut self, other: &AttributeSet) {
        for attribute in other.iter().filter(|a| a.present()) {
            self.attributes.remove(&attribute.attribute_type());
        }
    }

    /// Presence-filtered copy.
    pub fn present_subset(&self) -> AttributeSet {
        let mut subset = AttributeSet::new();
        subset.union_present(self);
        subset
    }

    pub fn mark_all_present(&mut self, present: bool) {
        for attribute in self.attributes.values_mut() {
            attribute.set_present(present);
        }
    }

    /// One record per present attribute, in ascending type order.
    /// Sensitive attributes are listed without value bytes.
    pub fn to_transfer_list(&self) -> Vec<RawRecord> {
        self.attributes
            .values()
            .filter_map(Attribute::to_raw_record)
            .collect()
    }

    /// Rebuild a set from transfer records. A record that cannot be decoded
    /// becomes an unrecognized placeholder instead of failing the set.
    pub fn from_transfer_list(records: &[RawRecord]) -> Self {
        let mut set = AttributeSet::new();
        for record in records {
            let attribute = match Attribute::from_transfer_record(record) {
                Ok(attribute) => attribute,
                Err(err) => {
                    warn!(
                        attribute = record.attribute_type,
                        error = %err,
                        "keeping undecodable nested attribute as raw bytes"
                    );
                    Attribute::unrecognized(record)
                }
            };
            set.add_attribute(attribute);
        }
        set
    }

    /// Search-filter semantics: every present attribute of `self` is present
    /// in `candidate` with an equal value.
    pub fn matches(&self, candidate: &AttributeSet) -> bool {
        self.iter().filter(|a| a.present()).all(|expected| {
            candidate
                .get(expected.attribute_type())
                .is_some_and(|actual| actual == expected)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes.values()
    }

    pub fn types(&self) -> impl Iterator<Item = AttributeType> + '_ {
        self.attributes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut set = AttributeSet::new();
        for attribute in iter {
            set.add_attribute(attribute);
        }
        set
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::collections::btree_map::Values<'a, AttributeType, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.values()
    }
}
