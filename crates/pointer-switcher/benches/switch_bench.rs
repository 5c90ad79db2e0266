//! Criterion benchmarks for the per-report switching path.
//!
//! Every mouse report that moves the pointer goes through identity resolution
//! and the engine, so the common case (the active device keeps moving) has to
//! stay far below the time between two reports of a 1000 Hz mouse.
//!
//! Run with:
//! ```bash
//! cargo bench --package pointer-switcher --bench switch_bench
//! ```

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pointer_core::{DeviceHandle, DevicePath, DeviceProfile, RawMotion};
use pointer_switcher::application::apply_settings::SettingsApplier;
use pointer_switcher::application::profile_store::InMemoryProfileStore;
use pointer_switcher::application::resolve_device::{
    CachingDevicePathQuery, DeviceIdentityResolver,
};
use pointer_switcher::application::switch_engine::{ManualClock, SwitchPolicy, SwitchingEngine};
use pointer_switcher::infrastructure::pointer_settings::mock::MockPointerBackend;
use pointer_switcher::infrastructure::raw_input::mock::MockDevicePathQuery;

// ── Fixture builders ──────────────────────────────────────────────────────────

fn device_path(i: usize) -> String {
    format!(r"\\?\HID#VID_046D&PID_{i:04X}#7&1f2a3b4c&0&0000#{{378de44c-56ef-11d1-bc8c-00a0c91405dd}}")
}

/// Builds a resolver and engine knowing `n` devices, with device 0 active.
fn build(n: usize) -> (DeviceIdentityResolver, SwitchingEngine) {
    let mut query = MockDevicePathQuery::new();
    let mut profiles = Vec::with_capacity(n);
    for i in 0..n {
        let raw = device_path(i);
        query = query.with_device(i as isize, &raw);
        let path = DevicePath::new(&raw).expect("generated paths are non-empty");
        profiles.push(DeviceProfile::new(format!("Mouse {i}"), path).with_speed(1 + (i % 20) as u32));
    }

    let resolver = DeviceIdentityResolver::new(Rc::new(CachingDevicePathQuery::new(query)));
    let mut engine = SwitchingEngine::new(
        Rc::new(InMemoryProfileStore::new(profiles)),
        SettingsApplier::new(Rc::new(MockPointerBackend::new())),
        Rc::new(ManualClock::new()),
        SwitchPolicy::default(),
    );
    let first = resolver
        .resolve(&RawMotion::mouse(DeviceHandle(0), 1, 0))
        .expect("device 0 resolves");
    engine.on_device_motion(&first);
    (resolver, engine)
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_active_device_motion(c: &mut Criterion) {
    let mut group = c.benchmark_group("active_device_motion");
    for n in [1usize, 4, 16] {
        let (resolver, mut engine) = build(n);
        let motion = RawMotion::mouse(DeviceHandle(0), 3, -2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let path = resolver.resolve(black_box(&motion));
                if let Some(path) = path {
                    black_box(engine.on_device_motion(&path));
                }
            });
        });
    }
    group.finish();
}

fn bench_resolve_cached(c: &mut Criterion) {
    let (resolver, _) = build(4);
    let motion = RawMotion::mouse(DeviceHandle(2), 1, 1);
    c.bench_function("resolve_cached_path", |b| {
        b.iter(|| black_box(resolver.resolve(black_box(&motion))));
    });
}

fn bench_zero_motion_rejected(c: &mut Criterion) {
    let (resolver, _) = build(1);
    let click = RawMotion::mouse(DeviceHandle(0), 0, 0);
    c.bench_function("resolve_zero_motion", |b| {
        b.iter(|| black_box(resolver.resolve(black_box(&click))));
    });
}

criterion_group!(
    benches,
    bench_active_device_motion,
    bench_resolve_cached,
    bench_zero_motion_rejected
);
criterion_main!(benches);
