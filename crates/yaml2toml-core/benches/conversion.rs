use criterion::{black_box, criterion_group, criterion_main, Criterion};
use yaml2toml_core::{convert, decode, encode, Format};

fn sample_yaml(services: usize) -> String {
    let mut out = String::from("name: fleet\nversion: 3\nservices:\n");
    for i in 0..services {
        out.push_str(&format!(
            "  - name: svc-{i}\n    port: {}\n    replicas: {}\n    tags: [web, internal]\n    limits:\n      cpu: 0.5\n      memory: 512Mi\n",
            8000 + i,
            i % 5 + 1
        ));
    }
    out
}

fn bench_conversion(c: &mut Criterion) {
    let small = sample_yaml(5);
    let large = sample_yaml(500);

    c.bench_function("yaml_to_toml_small", |b| {
        b.iter(|| convert(black_box(small.as_bytes()), Format::Yaml, Format::Toml).unwrap())
    });
    c.bench_function("yaml_to_toml_large", |b| {
        b.iter(|| convert(black_box(large.as_bytes()), Format::Yaml, Format::Toml).unwrap())
    });

    let value = decode(large.as_bytes(), Format::Yaml).unwrap();
    c.bench_function("encode_toml_large", |b| {
        b.iter(|| encode(black_box(&value), Format::Toml).unwrap())
    });
    c.bench_function("decode_yaml_large", |b| {
        b.iter(|| decode(black_box(large.as_bytes()), Format::Yaml).unwrap())
    });
}

criterion_group!(benches, bench_conversion);
criterion_main!(benches);
