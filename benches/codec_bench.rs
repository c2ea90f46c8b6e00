//! Benchmarks for the four hot paths: encode, decode, pack, unpack.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sproto_wire::codec;
use sproto_wire::pack;
use sproto_wire::schema::{Field, FieldKind, Schema, TypeDef};
use sproto_wire::Value;

fn person_schema() -> Schema {
    Schema::assemble(
        vec![TypeDef::new(
            "Person",
            vec![
                Field::new("name", 0, FieldKind::String),
                Field::new("age", 1, FieldKind::Integer),
                Field::new("active", 2, FieldKind::Boolean),
            ],
        )],
        vec![],
    )
}

fn profile_schema() -> Schema {
    Schema::assemble(
        vec![TypeDef::new(
            "Profile",
            vec![
                Field::new("id", 0, FieldKind::Integer),
                Field::new("username", 1, FieldKind::String),
                Field::new("email", 2, FieldKind::String),
                Field::new("age", 3, FieldKind::Integer),
                Field::new("verified", 4, FieldKind::Boolean),
                Field::new("score", 5, FieldKind::Double),
            ],
        )],
        vec![],
    )
}

fn dataset_schema() -> Schema {
    Schema::assemble(
        vec![TypeDef::new(
            "DataSet",
            vec![
                Field::new("numbers", 0, FieldKind::Integer).array(),
                Field::new("values", 1, FieldKind::Double).array(),
            ],
        )],
        vec![],
    )
}

fn person_value() -> Value {
    Value::record([
        ("name", "Alice".into()),
        ("age", 30i64.into()),
        ("active", true.into()),
    ])
}

fn profile_value() -> Value {
    Value::record([
        ("id", 12345i64.into()),
        ("username", "alice_wonder".into()),
        ("email", "alice@example.com".into()),
        ("age", 28i64.into()),
        ("verified", true.into()),
        ("score", 98.5f64.into()),
    ])
}

fn dataset_value(n: i64) -> Value {
    Value::record([
        ("numbers", (0..n).collect::<Vec<i64>>().into()),
        (
            "values",
            (0..n).map(|i| i as f64 * 0.1).collect::<Vec<f64>>().into(),
        ),
    ])
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let schema = person_schema();
    let ty = schema.type_by_name("Person").unwrap();
    let value = person_value();
    group.throughput(Throughput::Elements(1));
    group.bench_function("person", |b| {
        b.iter(|| codec::encode(black_box(&schema), black_box(ty), black_box(&value)).unwrap())
    });

    let schema = profile_schema();
    let ty = schema.type_by_name("Profile").unwrap();
    let value = profile_value();
    group.bench_function("profile", |b| {
        b.iter(|| codec::encode(black_box(&schema), black_box(ty), black_box(&value)).unwrap())
    });

    let schema = dataset_schema();
    let ty = schema.type_by_name("DataSet").unwrap();
    let value = dataset_value(100);
    group.bench_function("dataset_100", |b| {
        b.iter(|| codec::encode(black_box(&schema), black_box(ty), black_box(&value)).unwrap())
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let schema = person_schema();
    let ty = schema.type_by_name("Person").unwrap();
    let bytes = codec::encode(&schema, ty, &person_value()).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("person", |b| {
        b.iter(|| codec::decode(black_box(&schema), black_box(ty), black_box(&bytes)).unwrap())
    });

    let schema = profile_schema();
    let ty = schema.type_by_name("Profile").unwrap();
    let bytes = codec::encode(&schema, ty, &profile_value()).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("profile", |b| {
        b.iter(|| codec::decode(black_box(&schema), black_box(ty), black_box(&bytes)).unwrap())
    });

    let schema = dataset_schema();
    let ty = schema.type_by_name("DataSet").unwrap();
    let bytes = codec::encode(&schema, ty, &dataset_value(100)).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("dataset_100", |b| {
        b.iter(|| codec::decode(black_box(&schema), black_box(ty), black_box(&bytes)).unwrap())
    });

    group.finish();
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");

    let schema = dataset_schema();
    let ty = schema.type_by_name("DataSet").unwrap();
    for n in [10i64, 100, 1000] {
        let bytes = codec::encode(&schema, ty, &dataset_value(n)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(bytes.len()), &bytes, |b, data| {
            b.iter(|| pack::pack(black_box(data)))
        });
    }

    group.finish();
}

fn bench_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack");

    let schema = dataset_schema();
    let ty = schema.type_by_name("DataSet").unwrap();
    for n in [10i64, 100, 1000] {
        let packed = pack::pack(&codec::encode(&schema, ty, &dataset_value(n)).unwrap());
        group.throughput(Throughput::Bytes(packed.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(packed.len()),
            &packed,
            |b, data| b.iter(|| pack::unpack(black_box(data)).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_pack, bench_unpack);
criterion_main!(benches);
