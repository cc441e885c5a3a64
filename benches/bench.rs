//! Criterion benchmarks for Tessera.
//!
//! Covers field conversion of structured and typed documents and the
//! full indexing pipeline over the in-memory store.

use std::hint::black_box;
use std::sync::Arc;

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Map, Value, json};

use tessera::document::{Document, FieldStore, FieldValue, TypedObject};
use tessera::index::MemoryIndexStore;
use tessera::indexing::{
    FieldConverter, IdentityMap, InMemoryIndexingStats, SimpleIndex, WorkContext,
};
use tessera::schema::{IndexDefinition, SortOptions};

/// Generate JSON documents with a mix of scalar and nested properties.
fn generate_json_documents(count: usize) -> Vec<Map<String, Value>> {
    (0..count)
        .map(|i| {
            let value = json!({
                "__document_id": format!("users/{i}"),
                "Name": format!("user number {i}"),
                "Age": i % 90,
                "Score": i as f64 * 0.25,
                "Active": i % 2 == 0,
                "Joined": "2020-05-01T10:30:00.000Z",
                "Tags": ["alpha", "beta", "gamma"],
                "Address": { "City": "Hadera", "Zip": i % 1000 },
                "Nick": null
            });
            match value {
                Value::Object(map) => map,
                _ => Map::new(),
            }
        })
        .collect()
}

fn generate_typed_documents(count: usize) -> Vec<TypedObject> {
    (0..count)
        .map(|i| {
            TypedObject::new()
                .with_id(format!("orders/{i}"))
                .with("Total", i as i32)
                .with("Price", i as f32 * 1.5)
                .with("Company", format!("companies/{}", i % 10))
                .with(
                    "Lines",
                    FieldValue::Array(vec![
                        FieldValue::from("widget"),
                        FieldValue::Array(vec![FieldValue::from(1i64), FieldValue::from(2i64)]),
                    ]),
                )
        })
        .collect()
}

fn bench_field_conversion(c: &mut Criterion) {
    let definition = IndexDefinition::new()
        .with_sort("Total", SortOptions::Long)
        .with_sort("Price", SortOptions::Double);
    let json_documents = generate_json_documents(100);
    let typed_documents = generate_typed_documents(100);

    let mut group = c.benchmark_group("field_conversion");
    group.throughput(Throughput::Elements(100));

    group.bench_function("index_json", |b| {
        b.iter(|| {
            let mut converter = FieldConverter::new(&definition);
            for document in &json_documents {
                let _ = black_box(converter.index_json(black_box(document), FieldStore::No));
            }
        })
    });

    group.bench_function("index_object", |b| {
        b.iter(|| {
            let mut converter = FieldConverter::new(&definition);
            for object in &typed_documents {
                let _ = black_box(converter.index_object(black_box(object), FieldStore::No));
            }
        })
    });

    group.finish();
}

fn bench_index_documents(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_documents");

    for batch_size in [100usize, 1000] {
        let documents: Vec<Document> = (0..batch_size)
            .map(|i| {
                Document::from_value(
                    format!("users/{i}"),
                    json!({ "Name": format!("user {i}"), "Age": i, "Tags": ["a", "b"] }),
                )
            })
            .collect();

        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &documents,
            |b, documents| {
                b.iter(|| {
                    let store = Arc::new(MemoryIndexStore::new("Users"));
                    let index = SimpleIndex::new("Users", IndexDefinition::new(), store);
                    let context = WorkContext::new();
                    let mut stats = InMemoryIndexingStats::new();
                    let _ = black_box(index.index_documents(
                        documents.iter().cloned(),
                        &IdentityMap,
                        &context,
                        &mut stats,
                        Utc::now(),
                    ));
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_field_conversion, bench_index_documents);
criterion_main!(benches);
