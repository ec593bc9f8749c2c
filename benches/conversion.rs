// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Conversion benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scad_scene::geometry::Primitive;
use scad_scene::{parse_scad, render, CancellationToken, ConversionConfig, Converter};

const PLATE: &str = r#"
    difference() {
        cube([40, 40, 4]);
        translate([10, 10, 0]) cylinder(h = 10, r = 3, center = true);
        translate([30, 10, 0]) cylinder(h = 10, r = 3, center = true);
        translate([10, 30, 0]) cylinder(h = 10, r = 3, center = true);
        translate([30, 30, 0]) cylinder(h = 10, r = 3, center = true);
    }
"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("simple_cube", |b| {
        b.iter(|| parse_scad(black_box("cube([10, 10, 10]);")).unwrap())
    });
    group.bench_function("plate", |b| b.iter(|| parse_scad(black_box(PLATE)).unwrap()));

    group.finish();
}

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");

    group.bench_function("cube", |b| {
        b.iter(|| Primitive::cuboid(black_box(10.0), 10.0, 10.0).to_geometry())
    });
    for segments in [16u32, 32, 64] {
        group.bench_with_input(BenchmarkId::new("sphere", segments), &segments, |b, &n| {
            b.iter(|| Primitive::sphere_with_segments(black_box(5.0), n, n / 2).to_geometry())
        });
    }

    group.finish();
}

fn bench_booleans(c: &mut Criterion) {
    let mut group = c.benchmark_group("booleans");
    group.sample_size(20);
    let config = ConversionConfig::default();

    group.bench_function("plate_with_holes", |b| {
        b.iter(|| render(black_box(PLATE), &config).unwrap())
    });

    for fn_ in [8u32, 16, 32] {
        let source = format!(
            "intersection() {{ cube(10, center = true); sphere(r = 6.5, $fn = {}); }}",
            fn_
        );
        let nodes = parse_scad(&source).unwrap();
        let converter = Converter::new();
        group.bench_with_input(BenchmarkId::new("rounded_cube", fn_), &nodes, |b, nodes| {
            b.iter(|| {
                converter
                    .convert_blocking(&nodes[0], 0, &config, &CancellationToken::new())
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_primitives, bench_booleans);
criterion_main!(benches);
