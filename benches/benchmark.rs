use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use variantry::manager::RegistryManager;
use variantry::profile::{export_profile, import_profile, ImportFlags};
use variantry::registry::Registry;
use variantry::repository::Repository;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

pub fn criterion_benchmark(c: &mut Criterion) {
    let manager = RegistryManager::from_file(format!("{FIXTURES}/geometry.toml")).unwrap();
    c.bench_function("build registry", |b| {
        b.iter(|| Registry::from_manager(black_box(&manager)).unwrap())
    });

    let mut registry = Registry::from_manager(&manager).unwrap();
    let mut advanced = false;
    c.bench_function("toggle layout", |b| {
        b.iter(|| {
            advanced = !advanced;
            let layout = if advanced { "advanced" } else { "basic" };
            registry.cmd_set_parameter_value("layout", black_box(layout)).unwrap();
        })
    });

    let mut repository = Repository::from_file(format!("{FIXTURES}/repository.toml")).unwrap();
    let mut debug = false;
    c.bench_function("cascade across registries", |b| {
        b.iter(|| {
            debug = !debug;
            repository.cmd_set_parameter_value("geo", "debug", if debug { "true" } else { "false" }).unwrap();
        })
    });

    repository.cmd_set_parameter_value("geo", "layout", "advanced").unwrap();
    repository.cmd_set_parameter_value("phys", "mode", "precise").unwrap();
    c.bench_function("export profile", |b| b.iter(|| export_profile(black_box(&repository)).unwrap()));

    let profile = export_profile(&repository).unwrap();
    let mut target = Repository::from_file(format!("{FIXTURES}/repository.toml")).unwrap();
    c.bench_function("import profile", |b| {
        b.iter(|| import_profile(&mut target, black_box(&profile), ImportFlags::default()).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
