use atype::{Field, FieldType, Schema, SchemaAlgebra, SchemaRef, parse_schema};
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;

fn schema(name: &str, prefix: &str, n: usize) -> SchemaRef {
    Schema::builder(name)
        .fields((0..n).map(|i| Field::required(format!("{prefix}{i}"), FieldType::String)))
        .build()
        .unwrap()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let a = schema("A", "a", 16);
    let b = schema("B", "b", 16);

    // Benchmark cache hit
    let algebra = SchemaAlgebra::new();
    algebra.merge_schemas(&a, &b).unwrap();
    group.bench_function("cached", |bench| {
        bench.iter(|| algebra.merge_schemas(black_box(&b), black_box(&a)).unwrap());
    });

    // Benchmark cold merge
    group.bench_function("cold", |bench| {
        bench.iter(|| {
            let algebra = SchemaAlgebra::new();
            algebra.merge_schemas(black_box(&a), black_box(&b)).unwrap()
        });
    });

    group.finish();
}

fn bench_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("records");
    let algebra = SchemaAlgebra::new();
    let m = schema("M", "f", 8);
    let optional = algebra.make_all_fields_optional(&m).unwrap();
    let value = json!({
        "f0": "a", "f1": "b", "f2": "c", "f3": "d",
        "f4": "e", "f5": "f", "f6": "g", "f7": "h"
    });

    group.bench_function("validate", |bench| {
        bench.iter(|| m.record(black_box(value.clone())).unwrap());
    });

    let record = m.record(value.clone()).unwrap();
    group.bench_function("conform_to_optional", |bench| {
        bench.iter(|| record.conform_to(black_box(&optional)).unwrap());
    });

    group.finish();
}

fn bench_dsl(c: &mut Criterion) {
    let source = r#"
        struct Address { city: String, zip: Option<String> }
        struct Person { name: String, age: Option<i64>, home: Address, tags: Vec<String> }
    "#;
    c.bench_function("dsl_parse", |bench| {
        bench.iter(|| parse_schema(black_box(source)).unwrap());
    });
}

criterion_group!(benches, bench_merge, bench_records, bench_dsl);
criterion_main!(benches);
