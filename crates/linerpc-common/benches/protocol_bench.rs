// Criterion benchmarks for the linerpc-common protocol layer
//
// Run benchmarks with:
//   cargo bench -p linerpc-common
//
// For detailed output with plots:
//   cargo bench -p linerpc-common -- --save-baseline main

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use linerpc_common::protocol::{Batch, Request, RequestId, Response, UnionRequest};
use serde_json::{json, Value};

fn bench_batch_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_decode");

    let single = br#"{"jsonrpc":"2.0","method":"add","params":{"a":2,"b":3},"id":1}"#;
    let batch_of_ten: Vec<u8> = {
        let items: Vec<Value> = (0..10)
            .map(|i| json!({"jsonrpc": "2.0", "method": "add", "params": {"a": i, "b": i}, "id": i}))
            .collect();
        serde_json::to_vec(&items).unwrap()
    };

    group.bench_function("decode_single", |b| {
        b.iter(|| Batch::<UnionRequest>::from_slice(black_box(single)));
    });

    group.bench_function("decode_batch_of_ten", |b| {
        b.iter(|| Batch::<UnionRequest>::from_slice(black_box(&batch_of_ten)));
    });

    group.finish();
}

fn bench_batch_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_encode");

    let single: Batch<Response<Value>> = Batch::single(Response::success(
        RequestId::Number(1),
        json!({"sum": 5}),
    ));
    let batch_of_ten: Batch<Response<Value>> = Batch::array(
        (0..10)
            .map(|i| Response::success(RequestId::Number(i), json!({"sum": i})))
            .collect(),
    );

    group.bench_function("encode_single", |b| {
        b.iter(|| black_box(&single).to_vec());
    });

    group.bench_function("encode_batch_of_ten", |b| {
        b.iter(|| black_box(&batch_of_ten).to_vec());
    });

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let method: UnionRequest = serde_json::from_str(
        r#"{"jsonrpc":"2.0","method":"add","params":{"a":1,"b":2},"id":1}"#,
    )
    .unwrap();
    let notification: UnionRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notify","params":{}}"#).unwrap();
    let response: UnionRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","result":{"sum":3},"id":1}"#).unwrap();

    group.bench_function("classify_method", |b| {
        b.iter(|| black_box(&method).classify());
    });

    group.bench_function("classify_notification", |b| {
        b.iter(|| black_box(&notification).classify());
    });

    group.bench_function("classify_response", |b| {
        b.iter(|| black_box(&response).classify());
    });

    group.finish();
}

fn bench_request_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_serialization");

    let small = Request::new(1, "method", Some(json!({"value": 42})));
    let data: Vec<String> = (0..100).map(|i| format!("item_{}", i)).collect();
    let large = Request::new(1, "method", Some(json!({ "data": data })));

    group.bench_function("serialize_small", |b| {
        b.iter(|| serde_json::to_string(black_box(&small)));
    });

    group.bench_function("serialize_large", |b| {
        b.iter(|| serde_json::to_string(black_box(&large)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_batch_decode,
    bench_batch_encode,
    bench_classify,
    bench_request_serialization,
);
criterion_main!(benches);
