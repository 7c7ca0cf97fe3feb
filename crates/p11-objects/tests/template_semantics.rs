use cryptoki_sys::{
    CK_ULONG, CKA_CLASS, CKA_DECRYPT, CKA_EXTRACTABLE, CKA_ID, CKA_KEY_TYPE, CKA_LABEL,
    CKA_SENSITIVE, CKA_UNWRAP_TEMPLATE, CKA_VALUE, CKK_AES, CKM_AES_CBC, CKM_AES_KEY_GEN,
    CKM_RSA_PKCS, CKM_RSA_PKCS_KEY_PAIR_GEN, CKM_SHA256, CKM_SHA256_RSA_PKCS,
    CKM_VENDOR_DEFINED, CKO_SECRET_KEY,
};
use p11_objects::mechanism;
use p11_objects::object::{BaseObject, RsaPrivateKey};
use p11_objects::{
    Attribute, AttributeSet, MemoryToken, ObjectResolver, TypedObject, TypedValue, VendorRegistry,
};

fn secret_key_template() -> AttributeSet {
    AttributeSet::new()
        .with(CKA_CLASS, CKO_SECRET_KEY)
        .and_then(|set| set.with(CKA_KEY_TYPE, CKK_AES))
        .and_then(|set| set.with(CKA_LABEL, "kek"))
        .expect("secret key template")
}

#[test]
fn union_then_subtract_restores_disjoint_sets() {
    let a = secret_key_template();
    let b = AttributeSet::new()
        .with(CKA_DECRYPT, true)
        .and_then(|set| set.with(CKA_ID, vec![7u8]))
        .expect("b");

    let mut merged = a.clone();
    merged.union_all(&b);
    assert_eq!(merged.len(), a.len() + b.len());
    merged.subtract_all(&b);
    assert_eq!(merged, a);
}

#[test]
fn union_present_ignores_absent_slots() {
    let mut source = AttributeSet::with_slots(&[CKA_ID, CKA_VALUE]);
    source.set_value(CKA_ID, vec![1u8]).expect("id");

    let mut target = secret_key_template();
    target.union_present(&source);
    assert!(target.contains_type(CKA_ID));
    assert!(!target.contains_type(CKA_VALUE));
}

#[test]
fn sensitive_values_never_leak() {
    let mut attribute = Attribute::with_value(CKA_VALUE, vec![0xAAu8; 16]).expect("value");
    attribute.mark_sensitive();
    assert!(attribute.value().is_none());
    assert!(attribute.bytes_value().is_none());
    assert!(attribute.to_string().ends_with("<Value is sensitive>"));

    let cloned = attribute.clone();
    assert!(cloned.value().is_none());

    let mut set = AttributeSet::new();
    set.add_attribute(attribute);
    let mut union = AttributeSet::new();
    union.union_all(&set);
    union.union_present(&set);
    let copied = union.get(CKA_VALUE).expect("copied");
    assert!(copied.sensitive());
    assert!(copied.value().is_none());
    assert!(union.to_transfer_list()[0].payload.is_empty());
}

#[test]
fn nested_templates_survive_transfer() {
    let unwrap = AttributeSet::new()
        .with(CKA_SENSITIVE, true)
        .and_then(|set| set.with(CKA_EXTRACTABLE, false))
        .expect("unwrap template");
    let mut key = RsaPrivateKey::new();
    key.set_attribute(CKA_UNWRAP_TEMPLATE, unwrap.clone())
        .expect("unwrap template slot");

    let token = MemoryToken::new();
    let handle = token.create_object(&key.build_template());
    let registry = VendorRegistry::new();
    let resolver = ObjectResolver::new(&token).with_registry(&registry);
    let object = resolver.resolve_object(handle).expect("resolve");

    let nested = object
        .attribute(CKA_UNWRAP_TEMPLATE)
        .and_then(Attribute::template_value)
        .expect("nested template");
    assert_eq!(nested, &unwrap);
}

#[test]
fn search_templates_match_on_present_values() {
    let token = MemoryToken::new();
    let kek = token.create_object(&secret_key_template());
    let _other = token.create_object(
        &AttributeSet::new()
            .with(CKA_CLASS, CKO_SECRET_KEY)
            .and_then(|set| set.with(CKA_LABEL, "dek"))
            .expect("dek"),
    );

    let mut filter = AttributeSet::with_slots(&[CKA_ID]);
    filter.insert_value(CKA_LABEL, "kek").expect("label filter");
    assert_eq!(token.find_objects(&filter), vec![kek]);
}

#[test]
fn generic_object_accepts_any_class_value() {
    let mut object = BaseObject::new();
    object
        .set_attribute(CKA_CLASS, 0x8000_1234 as CK_ULONG)
        .expect("class");
    let err = object
        .set_attribute(CKA_CLASS, TypedValue::Bool(true))
        .expect_err("class is a ulong");
    assert!(err.to_string().contains("expects"));
}

#[test]
fn mechanism_predicates() {
    mechanism::init_mechanism_tables();

    assert!(mechanism::is_key_gen(CKM_AES_KEY_GEN));
    assert!(mechanism::is_key_pair_gen(CKM_RSA_PKCS_KEY_PAIR_GEN));
    assert!(mechanism::is_digest(CKM_SHA256));
    assert!(mechanism::supports_streaming(CKM_SHA256_RSA_PKCS));
    assert!(mechanism::supports_streaming(CKM_AES_CBC));
    assert!(mechanism::supports_recovery(CKM_RSA_PKCS));
    assert!(mechanism::is_wrap_unwrap(CKM_RSA_PKCS));
    assert!(!mechanism::is_digest(CKM_AES_CBC));

    let vendor = CKM_VENDOR_DEFINED | 0x99;
    assert!(!mechanism::supports_streaming(vendor));
    assert!(!mechanism::is_key_gen(vendor));
    assert_eq!(mechanism::mechanism_name(vendor), "VENDOR_DEFINED [0x80000099]");
    assert_eq!(mechanism::mechanism_code("CKM_SHA256"), Some(CKM_SHA256));
}
