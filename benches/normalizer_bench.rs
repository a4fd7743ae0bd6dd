use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use site_audit::audit::normalize;

fn sample_response(category_key: &str) -> Value {
    let mut audits = serde_json::Map::new();
    for i in 0..200 {
        audits.insert(
            format!("audit-{}", i),
            json!({ "displayValue": format!("{} ms", i), "score": 0.5 }),
        );
    }
    audits.insert(
        "largest-contentful-paint".to_string(),
        json!({ "displayValue": "1.2 s", "score": 0.93 }),
    );

    json!({
        "lighthouseResult": {
            "categories": {
                "performance": { "score": 0.87 },
                "accessibility": { "score": 0.95 },
                category_key: { "score": 1.0 },
                "seo": { "score": 0.9 }
            },
            "audits": audits
        }
    })
}

fn bench_normalize(c: &mut Criterion) {
    let kebab = sample_response("best-practices");
    let camel = sample_response("bestPractices");
    let sparse = json!({ "lighthouseResult": { "categories": {} } });

    let mut group = c.benchmark_group("normalize");
    group.bench_function("kebab_case", |b| b.iter(|| normalize(black_box(&kebab))));
    group.bench_function("camel_case", |b| b.iter(|| normalize(black_box(&camel))));
    group.bench_function("sparse", |b| b.iter(|| normalize(black_box(&sparse))));
    group.finish();
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
