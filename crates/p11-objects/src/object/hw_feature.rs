use cryptoki_sys::{
    CK_ULONG, CKA_BITS_PER_PIXEL, CKA_CHAR_COLUMNS, CKA_CHAR_ROWS, CKA_CHAR_SETS, CKA_COLOR,
    CKA_ENCODING_METHODS, CKA_HAS_RESET, CKA_HW_FEATURE_TYPE, CKA_MIME_TYPES, CKA_PIXEL_X,
    CKA_PIXEL_Y, CKA_RESET_ON_INIT, CKA_RESOLUTION, CKA_VALUE,
};

use super::{ObjectKind, TypedObject};
use crate::types::HardwareFeatureType;

pub trait HardwareFeatureObject: TypedObject {
    attribute_getters! { @trait
        hw_feature_type(CKA_HW_FEATURE_TYPE) -> ulong_value: Option<CK_ULONG>;
    }
}

typed_object! {
    /// Hardware feature of a type without a dedicated layout.
    pub struct BaseHardwareFeature = ObjectKind::HardwareFeature(None);
    impl [HardwareFeatureObject];
}

typed_object! {
    pub struct MonotonicCounter =
        ObjectKind::HardwareFeature(Some(HardwareFeatureType::MonotonicCounter));
    impl [HardwareFeatureObject];
    getters {
        /// Current counter value, big endian
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
        reset_on_init(CKA_RESET_ON_INIT) -> bool_value: Option<bool>;
        has_reset(CKA_HAS_RESET) -> bool_value: Option<bool>;
    }
}

typed_object! {
    pub struct Clock = ObjectKind::HardwareFeature(Some(HardwareFeatureType::Clock));
    impl [HardwareFeatureObject];
    getters {
        /// `YYYYMMDDhhmmss00` as 16 ASCII characters
        value(CKA_VALUE) -> bytes_value: Option<&[u8]>;
    }
}

typed_object! {
    pub struct UserInterface =
        ObjectKind::HardwareFeature(Some(HardwareFeatureType::UserInterface));
    impl [HardwareFeatureObject];
    getters {
        pixel_x(CKA_PIXEL_X) -> ulong_value: Option<CK_ULONG>;
        pixel_y(CKA_PIXEL_Y) -> ulong_value: Option<CK_ULONG>;
        resolution(CKA_RESOLUTION) -> ulong_value: Option<CK_ULONG>;
        char_rows(CKA_CHAR_ROWS) -> ulong_value: Option<CK_ULONG>;
        char_columns(CKA_CHAR_COLUMNS) -> ulong_value: Option<CK_ULONG>;
        color(CKA_COLOR) -> bool_value: Option<bool>;
        bits_per_pixel(CKA_BITS_PER_PIXEL) -> ulong_value: Option<CK_ULONG>;
        char_sets(CKA_CHAR_SETS) -> bytes_value: Option<&[u8]>;
        encoding_methods(CKA_ENCODING_METHODS) -> bytes_value: Option<&[u8]>;
        mime_types(CKA_MIME_TYPES) -> bytes_value: Option<&[u8]>;
    }
}

impl Clock {
    /// Clock value as text, when it is valid ASCII.
    pub fn time_string(&self) -> Option<&str> {
        self.value().and_then(|raw| std::str::from_utf8(raw).ok())
    }
}

object_enum! {
    pub enum HardwareFeature {
        MonotonicCounter(MonotonicCounter),
        Clock(Clock),
        UserInterface(UserInterface),
        Other(BaseHardwareFeature),
    }
    impl [HardwareFeatureObject];
}

impl HardwareFeature {
    pub fn new(feature: Option<HardwareFeatureType>) -> Self {
        match feature {
            Some(HardwareFeatureType::MonotonicCounter) => MonotonicCounter::new().into(),
            Some(HardwareFeatureType::Clock) => Clock::new().into(),
            Some(HardwareFeatureType::UserInterface) => UserInterface::new().into(),
            None => BaseHardwareFeature::new().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoki_sys::{CKA_LABEL, CKH_CLOCK};

    #[test]
    fn hardware_features_are_not_storage_objects() {
        let clock = Clock::new();
        assert_eq!(clock.hw_feature_type(), Some(CKH_CLOCK));
        assert!(clock.attribute(CKA_LABEL).is_none());
    }

    #[test]
    fn clock_value_reads_as_text() {
        let mut clock = Clock::new();
        clock
            .set_attribute(CKA_VALUE, b"2026101612000000".as_slice())
            .expect("clock value");
        assert_eq!(clock.time_string(), Some("2026101612000000"));
    }

    #[test]
    fn user_interface_mixes_value_kinds() {
        let mut ui = UserInterface::new();
        ui.set_attribute(CKA_COLOR, true).expect("color");
        ui.set_attribute(CKA_PIXEL_X, 320 as CK_ULONG).expect("pixel x");
        ui.set_attribute(CKA_MIME_TYPES, b"image/png".as_slice())
            .expect("mime types");
        assert_eq!(ui.color(), Some(true));
        assert_eq!(ui.pixel_x(), Some(320));
        assert_eq!(ui.mime_types(), Some(b"image/png".as_slice()));
        assert!(ui.set_attribute(CKA_COLOR, 1 as CK_ULONG).is_err());
    }
}
