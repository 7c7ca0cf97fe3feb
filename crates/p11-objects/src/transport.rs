use crate::attribute::RawRecord;
use crate::error::ReadFault;
use crate::types::{AttributeType, ObjectHandle};

/// Attribute read access to a token, typically backed by
/// `C_GetAttributeValue` on an open session.
pub trait AttributeReader: Send + Sync {
    fn read_attribute(
        &self,
        handle: ObjectHandle,
        attribute_type: AttributeType,
    ) -> Result<RawRecord, ReadFault>;

    /// Read several attributes in one call. Records come back in request
    /// order; any failing attribute fails the whole call, as
    /// `C_GetAttributeValue` does.
    fn read_attributes(
        &self,
        handle: ObjectHandle,
        attribute_types: &[AttributeType],
    ) -> Result<Vec<RawRecord>, ReadFault> {
        attribute_types
            .iter()
            .map(|attribute_type| self.read_attribute(handle, *attribute_type))
            .collect()
    }
}
