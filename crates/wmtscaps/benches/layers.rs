use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use wmtscaps::{convert, extract_layers, layers_from_str, tile_url, ExtractConfig};

const CAPABILITIES_XML: &str = include_str!("../tests/fixtures/capabilities.xml");
const TEMPLATE: &str =
    "https://wmts.geo.admin.ch/1.0.0/ch.swisstopo.swissimage/default/{Time}/3857/{TileMatrix}/{TileCol}/{TileRow}.jpeg";

fn bench_extract(c: &mut Criterion) {
    let tree = convert(CAPABILITIES_XML, &["Layer"]);

    c.bench_function("extract_layers", |b| {
        b.iter(|| tree.as_ref().map(|tree| extract_layers(black_box(tree))))
    });

    c.bench_function("layers_from_str", |b| {
        b.iter(|| layers_from_str(black_box(CAPABILITIES_XML), &ExtractConfig::default()))
    });
}

fn bench_tile_url(c: &mut Criterion) {
    c.bench_function("tile_url", |b| {
        b.iter(|| tile_url(black_box(TEMPLATE), black_box("current")))
    });
}

criterion_group!(benches, bench_extract, bench_tile_url);
criterion_main!(benches);
