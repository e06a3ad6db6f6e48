use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use wizard::{FlowKind, SessionRegistry, StepCommand, build_initial_state, transition};

fn bench_build_initial_state(c: &mut Criterion) {
    c.bench_function("wizard/build_initial_state", |b| {
        b.iter(|| build_initial_state(FlowKind::Booking.paths().iter().copied()).unwrap());
    });
}

fn bench_save_step_data(c: &mut Criterion) {
    let store = FlowKind::Booking.initial_state();

    c.bench_function("wizard/save_step_data", |b| {
        b.iter(|| {
            transition(
                &store,
                StepCommand::save("dates", json!({ "start_date": "2026-11-01", "end_date": "2026-11-05" })),
            )
            .unwrap()
        });
    });
}

fn bench_full_flow(c: &mut Criterion) {
    c.bench_function("wizard/fill_booking_flow", |b| {
        b.iter(|| {
            let mut store = FlowKind::Booking.initial_state();
            for path in FlowKind::Booking.paths() {
                store = store
                    .dispatch_all(vec![
                        StepCommand::save(*path, json!({ "visited": true })),
                        StepCommand::set_current(*path),
                    ])
                    .unwrap();
            }
            store
        });
    });
}

fn bench_registry_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = SessionRegistry::new();
    let id = rt.block_on(async { registry.create(FlowKind::Booking).await.id() });

    c.bench_function("wizard/registry_dispatch", |b| {
        b.iter(|| {
            rt.block_on(async {
                registry
                    .dispatch(id, StepCommand::save("guests", json!({ "adults": 2 })))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_build_initial_state,
    bench_save_step_data,
    bench_full_flow,
    bench_registry_dispatch,
);
criterion_main!(benches);
