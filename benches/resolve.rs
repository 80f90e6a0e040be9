// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use skillsheets::format::bundle::normalize_bundle_at;
use skillsheets::migrate::SchemaMigrator;
use skillsheets::resolve::{validate_bundle, ResolveOptions};

mod fixtures;
mod profiler;

use fixtures::Case;

const CASES: [(&str, Case); 3] = [
    ("small", Case::Small),
    ("medium", Case::Medium),
    ("large", Case::Large),
];

// Benchmark identity (keep stable):
// - Group names in this file: `resolve.validate`, `format.normalize_legacy`,
//   `migrate.bundle`
// - Case IDs (`small`, `medium`, `large`) must remain stable across refactors.
fn benches_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve.validate");
    let options = ResolveOptions::default();

    for (name, case) in CASES {
        let bundle = fixtures::chain_bundle(case);
        group.throughput(Throughput::Elements(bundle.sheets.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let report = validate_bundle(black_box(&bundle), &options);
                black_box(report.warnings.len() + report.call_graph.len())
            })
        });
    }

    group.finish();
}

fn benches_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("format.normalize_legacy");

    for (name, case) in CASES {
        let raw = fixtures::legacy_bundle_json(case);
        group.throughput(Throughput::Elements(case.sheets() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let bundle = normalize_bundle_at(black_box(&raw), 0).expect("legacy bundle");
                black_box(fixtures::checksum_bundle(&bundle))
            })
        });
    }

    group.finish();
}

fn benches_migrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("migrate.bundle");
    let migrator = SchemaMigrator::builtin();

    for (name, case) in CASES {
        let bundle = fixtures::chain_bundle(case);
        group.throughput(Throughput::Elements(bundle.sheets.len() as u64));
        group.bench_function(name, |b| {
            b.iter_batched(
                || bundle.clone(),
                |mut bundle| {
                    let outcome = migrator.migrate_bundle(&mut bundle);
                    black_box(outcome.migrated_count)
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_validate, benches_normalize, benches_migrate
}
criterion_main!(benches);
