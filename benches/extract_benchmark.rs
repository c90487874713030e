use avito_tracker::services::extract;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

/// Build a search page with `n` realistic items embedded as hydration data.
fn synthetic_search_page(n: usize) -> String {
    let items: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "id": 4_000_000_000u64 + i as u64,
                "title": format!("{}-к. квартира, {},5 м², {}/10 эт.", i % 4 + 1, 30 + i % 60, i % 10 + 1),
                "priceDetailed": { "value": 2_000_000 + i * 10_000, "postfix": "" },
                "urlPath": format!("/yoshkar-ola/kvartiry/item_{}", i),
                "geo": {
                    "coords": { "lat": 56.6 + i as f64 * 0.001, "lng": 47.9 },
                    "geoReferences": [ { "content": format!("Улица {}, {}", i % 20, i) } ]
                }
            })
        })
        .collect();

    let hydration = json!({
        "loaderData": {
            "catalog-or-main-or-item": { "searchResult": { "items": items } }
        }
    });

    format!(
        "<html><head></head><body><div id=\"app\"></div>\
         <script>window.__staticRouterHydrationData = {};</script></body></html>",
        hydration
    )
}

fn synthetic_house_page(nested: bool) -> String {
    let characteristics = json!([
        { "items": [
            { "title": "Год постройки", "value": "1987" },
            { "title": "Этажей", "value": "10" },
            { "title": "Тип дома", "value": "Панельный" },
            { "title": "Отопление", "value": "Центральное" },
            { "title": "Парковка", "value": "Открытая во дворе" }
        ]}
    ]);

    let loader = if nested {
        // Characteristics buried in an unknown wrapper: forces the
        // deep-search fallback
        json!({ "wrapper": { "deeper": { "sections": characteristics } } })
    } else {
        json!({
            "houseInfo": { "sections": characteristics },
            "rating": { "value": 4.3, "count": 21 },
            "priceRange": { "min": 1_800_000, "max": 5_100_000 },
            "listings": { "total": 14 }
        })
    };

    let hydration = json!({ "loaderData": { "catalog-or-main-or-item": loader } });
    format!(
        "<html><script>window.__staticRouterHydrationData = {};</script></html>",
        hydration
    )
}

fn benchmark_extract(c: &mut Criterion) {
    let search_page = synthetic_search_page(50);
    let house_page = synthetic_house_page(false);
    let nested_house_page = synthetic_house_page(true);

    let mut group = c.benchmark_group("extract");

    group.bench_function("search_page_50_items", |b| {
        b.iter(|| extract::parse_search_page(black_box(&search_page), "https://www.avito.ru"))
    });

    group.bench_function("house_page_direct", |b| {
        b.iter(|| extract::parse_house_page(black_box(&house_page)))
    });

    group.bench_function("house_page_deep_search", |b| {
        b.iter(|| extract::parse_house_page(black_box(&nested_house_page)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_extract);
criterion_main!(benches);
