use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use cryptoki_sys::{
    CK_ULONG, CKA_CLASS, CKA_DECRYPT, CKA_ENCRYPT, CKA_KEY_TYPE, CKA_LABEL, CKA_TOKEN, CKA_VALUE,
    CKA_VALUE_LEN, CKK_AES, CKO_SECRET_KEY,
};
use p11_objects::{
    AttributeSet, MemoryToken, ObjectHandle, ObjectResolver, ResolverConfig, VendorRegistry,
};

fn secret_key_template(label: &str) -> AttributeSet {
    AttributeSet::new()
        .with(CKA_CLASS, CKO_SECRET_KEY)
        .and_then(|set| set.with(CKA_KEY_TYPE, CKK_AES))
        .and_then(|set| set.with(CKA_TOKEN, true))
        .and_then(|set| set.with(CKA_LABEL, label))
        .and_then(|set| set.with(CKA_ENCRYPT, true))
        .and_then(|set| set.with(CKA_DECRYPT, true))
        .and_then(|set| set.with(CKA_VALUE_LEN, 32 as CK_ULONG))
        .and_then(|set| set.with(CKA_VALUE, vec![0u8; 32]))
        .expect("secret key template")
}

fn populate_token(count: usize) -> (MemoryToken, Vec<ObjectHandle>) {
    let token = MemoryToken::new();
    let handles = (0..count)
        .map(|i| token.create_object(&secret_key_template(&format!("bench-key-{i:05}"))))
        .collect();
    (token, handles)
}

fn bench_find_objects(c: &mut Criterion) {
    let (token, _) = populate_token(1_000);
    let mut filter = AttributeSet::new();
    filter
        .insert_value(CKA_LABEL, "bench-key-00500")
        .expect("label filter");

    let mut group = c.benchmark_group("attribute_lookup");
    group.bench_function(BenchmarkId::new("find_objects", token.len()), |b| {
        b.iter(|| {
            let results = token.find_objects(black_box(&filter));
            black_box(results.len());
        });
    });
    group.finish();
}

fn bench_resolve_object(c: &mut Criterion) {
    let (token, handles) = populate_token(16);
    let registry = VendorRegistry::new();

    let mut group = c.benchmark_group("resolve_object");
    for batch_reads in [true, false] {
        let config = ResolverConfig {
            batch_reads,
            ..ResolverConfig::default()
        };
        let resolver = ObjectResolver::new(&token)
            .with_registry(&registry)
            .with_config(config);
        let label = if batch_reads { "batched" } else { "single" };
        group.bench_function(BenchmarkId::new(label, handles.len()), |b| {
            b.iter(|| {
                for handle in &handles {
                    let object = resolver.resolve_object(*handle).expect("resolve");
                    black_box(object);
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_objects, bench_resolve_object);
criterion_main!(benches);
