//! Integration tests for the step store.
//!
//! These cover the store's structural guarantees: unique paths, an intact
//! `next` chain, write isolation between steps, rejection of unknown paths
//! and last-write-wins saves.

use std::sync::Arc;

use serde_json::json;
use wizard::{
    FlowKind, SessionRegistry, StepCommand, StepStore, WizardError, build_initial_state, transition,
};

fn three_steps() -> StepStore {
    build_initial_state(["guests", "dates", "accommodation"]).unwrap()
}

mod structure {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn paths_are_unique_in_every_flow() {
        for flow in FlowKind::ALL {
            let store = flow.initial_state();
            let unique: HashSet<String> = store.paths().into_iter().collect();
            assert_eq!(unique.len(), store.len(), "{flow} has duplicate paths");
        }
    }

    #[test]
    fn next_chain_follows_registration_order() {
        for flow in FlowKind::ALL {
            let store = flow.initial_state();
            let steps: Vec<_> = store.steps().collect();

            for pair in steps.windows(2) {
                assert_eq!(pair[0].next.as_ref(), Some(&pair[1].path));
            }
            assert!(steps.last().unwrap().next.is_none());
        }
    }
}

mod writes {
    use super::*;

    #[test]
    fn save_leaves_other_steps_shared() {
        let before = three_steps();
        let after = transition(&before, StepCommand::save("guests", json!({ "adults": 2 }))).unwrap();

        for path in ["dates", "accommodation"] {
            assert!(Arc::ptr_eq(
                &before.shared_step(path).unwrap(),
                &after.shared_step(path).unwrap()
            ));
        }
        assert!(!Arc::ptr_eq(
            &before.shared_step("guests").unwrap(),
            &after.shared_step("guests").unwrap()
        ));
    }

    #[test]
    fn invalid_path_fails_before_any_change() {
        let before = three_steps()
            .dispatch(StepCommand::save("dates", json!({ "nights": 2 })))
            .unwrap();
        let snapshot = before.clone();

        let result = transition(&before, StepCommand::save("not-a-real-path", json!({})));

        match result {
            Err(WizardError::InvalidStepPath { path, valid }) => {
                assert_eq!(path, "not-a-real-path");
                assert_eq!(valid, vec!["guests", "dates", "accommodation"]);
            }
            other => panic!("expected InvalidStepPath, got {other:?}"),
        }
        assert_eq!(before, snapshot);
    }

    #[test]
    fn second_save_wins() {
        let store = three_steps()
            .dispatch(StepCommand::save("guests", json!({ "adults": 2, "children": 1 })))
            .unwrap()
            .dispatch(StepCommand::save("guests", json!({ "adults": 4 })))
            .unwrap();

        assert_eq!(
            serde_json::Value::Object(store.get_step_by_path("guests").unwrap().data.clone()),
            json!({ "adults": 4 })
        );
    }
}

#[test]
fn guests_dates_accommodation_scenario() {
    let store = three_steps();
    assert_eq!(store.len(), 3);
    assert!(store.steps().all(|s| s.data.is_empty()));

    let store = store
        .dispatch(StepCommand::save("guests", json!({ "adults": 2 })))
        .unwrap();

    assert_eq!(
        serde_json::Value::Object(store.get_step_by_path("guests").unwrap().data.clone()),
        json!({ "adults": 2 })
    );
    assert!(store.get_step_by_path("dates").unwrap().data.is_empty());
    assert!(store.get_step_by_path("accommodation").unwrap().data.is_empty());
    assert_eq!(store.get_current_step_index("dates"), Some(1));
}

#[tokio::test]
async fn concurrent_dispatches_are_serialized() {
    let registry = SessionRegistry::new();
    let id = registry.create(FlowKind::Booking).await.id();

    let mut handles = Vec::new();
    for adults in 1..=16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .dispatch(id, StepCommand::save("guests", json!({ "adults": adults })))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let session = registry.get(id).await.unwrap();
    let guests = session.store().get_step_by_path("guests").unwrap();
    assert_eq!(guests.data.len(), 1);
    let adults = guests.value("adults").and_then(|v| v.as_u64()).unwrap();
    assert!((1..=16).contains(&adults));
}
