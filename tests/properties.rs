//! Property tests for the attendance state machine and the duration calculator.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use proptest::prelude::*;

use timeclock_engine::calculation::{
    BREAK_BLOCK_HOURS, DEFAULT_MAX_BREAK_MINUTES, automatic_break_minutes, compute_duration,
};
use timeclock_engine::config::Settings;
use timeclock_engine::engine::AttendanceEngine;
use timeclock_engine::error::EngineError;
use timeclock_engine::models::{AttendanceState, Employee, NewEmployee};
use timeclock_engine::storage::{DocumentStore, MemoryStore, TIME_ENTRIES};

fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
        .unwrap()
}

fn employee_with_cap(break_duration: u32) -> Employee {
    serde_json::from_value(serde_json::json!({
        "id": "emp_001",
        "name": "Awa",
        "break_duration": break_duration
    }))
    .unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Step {
    ClockIn,
    ClockOut,
    StartBreak,
    EndBreak,
    GoOffline,
    GoOnline,
    Reconcile,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::ClockIn),
        3 => Just(Step::ClockOut),
        2 => Just(Step::StartBreak),
        2 => Just(Step::EndBreak),
        1 => Just(Step::GoOffline),
        1 => Just(Step::GoOnline),
        1 => Just(Step::Reconcile),
    ]
}

/// State the employee should be in after `step`, or `None` when the step is rejected.
fn expected_transition(state: AttendanceState, step: Step) -> Option<AttendanceState> {
    match (state, step) {
        (AttendanceState::Absent, Step::ClockIn) => Some(AttendanceState::Active),
        (AttendanceState::Active | AttendanceState::OnBreak, Step::ClockOut) => {
            Some(AttendanceState::Absent)
        }
        (AttendanceState::Active, Step::StartBreak) => Some(AttendanceState::OnBreak),
        (AttendanceState::OnBreak, Step::EndBreak) => Some(AttendanceState::Active),
        _ => None,
    }
}

fn check_invariants(engine: &AttendanceEngine, employee_id: &str) -> Result<(), TestCaseError> {
    let entries = engine.list_entries();
    let open: Vec<_> = entries.iter().filter(|e| e.is_open()).collect();
    prop_assert!(open.len() <= 1, "more than one open shift: {:?}", open);

    for entry in &entries {
        prop_assert_eq!(&entry.employee_id, employee_id);
        prop_assert!(entry.validate().is_ok(), "invalid entry {:?}", entry);
        let open_breaks = entry.breaks.iter().filter(|b| b.is_open()).count();
        prop_assert!(open_breaks <= 1);
        if !entry.is_open() {
            prop_assert_eq!(open_breaks, 0);
        }
    }
    Ok(())
}

async fn run_sequence(steps: Vec<(Step, i64)>, hire_offline: bool) -> Result<(), TestCaseError> {
    let remote = Arc::new(MemoryStore::new());
    let remote_store: Arc<dyn DocumentStore> = remote.clone();
    let engine = AttendanceEngine::open(remote_store, Arc::new(MemoryStore::new()), &Settings::default())
        .await
        .unwrap();

    // An employee hired offline keeps a local id until the first reconciliation,
    // even after the connection comes back.
    remote.set_connected(!hire_offline);
    let employee = engine
        .create_employee(serde_json::from_str::<NewEmployee>(r#"{"name": "Awa"}"#).unwrap())
        .await
        .unwrap();
    remote.set_connected(true);
    let mut employee_id = employee.id;

    let mut now = make_datetime("2026-01-12", "06:00:00");
    let mut state = AttendanceState::Absent;

    for (step, gap_minutes) in steps {
        now += Duration::minutes(gap_minutes);
        let result = match step {
            Step::ClockIn => engine.clock_in(&employee_id, now).await.map(|_| ()),
            Step::ClockOut => engine.clock_out(&employee_id, now).await.map(|_| ()),
            Step::StartBreak => engine.start_break(&employee_id, now).await.map(|_| ()),
            Step::EndBreak => engine.end_break(&employee_id, now).await.map(|_| ()),
            Step::GoOffline => {
                remote.set_connected(false);
                continue;
            }
            Step::GoOnline => {
                remote.set_connected(true);
                continue;
            }
            Step::Reconcile => {
                let outcome = engine.reconcile().await;
                if remote.is_connected().await {
                    prop_assert!(outcome.is_ok(), "reconcile failed online: {:?}", outcome);
                }
                if let Ok(report) = outcome {
                    if let Some(remote_id) = report.remapped_ids.get(&employee_id) {
                        employee_id = remote_id.clone();
                    }
                }
                prop_assert_eq!(engine.current_state(&employee_id).unwrap(), state);
                check_invariants(&engine, &employee_id)?;
                continue;
            }
        };

        match (expected_transition(state, step), result) {
            (Some(next), Ok(())) => state = next,
            (None, Err(EngineError::InvalidTransition { .. })) => {}
            (expected, actual) => {
                return Err(TestCaseError::fail(format!(
                    "{:?} from {:?}: expected {:?}, got {:?}",
                    step, state, expected, actual
                )));
            }
        }
        prop_assert_eq!(engine.current_state(&employee_id).unwrap(), state);
        check_invariants(&engine, &employee_id)?;
    }

    remote.set_connected(true);
    let report = engine.reconcile().await.unwrap();
    if let Some(remote_id) = report.remapped_ids.get(&employee_id) {
        employee_id = remote_id.clone();
    }
    prop_assert_eq!(engine.sync_status().await.unwrap().pending, 0);
    prop_assert_eq!(engine.current_state(&employee_id).unwrap(), state);
    check_invariants(&engine, &employee_id)?;

    let local: BTreeSet<String> = engine.list_entries().into_iter().map(|e| e.id).collect();
    let remote_entries = remote.list(TIME_ENTRIES).await.unwrap();
    for doc in &remote_entries {
        prop_assert_eq!(doc.data["employee_id"].as_str(), Some(employee_id.as_str()));
    }
    let remote_ids: BTreeSet<String> = remote_entries.into_iter().map(|d| d.id).collect();
    prop_assert!(local.iter().all(|id| !id.starts_with("offline_")));
    prop_assert_eq!(local, remote_ids);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_state_machine_invariants_hold(
        steps in prop::collection::vec((step_strategy(), 1i64..240), 1..40),
        hire_offline in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run_sequence(steps, hire_offline))?;
    }
}

proptest! {
    #[test]
    fn test_duration_is_pure_and_non_negative(
        offset_minutes in -600i64..1440,
        cap in 0u32..120,
    ) {
        let start = make_datetime("2026-01-15", "08:00:00");
        let end = start + Duration::minutes(offset_minutes);
        let employee = employee_with_cap(cap);

        let first = compute_duration(start, Some(end), Some(&employee));
        let second = compute_duration(start, Some(end), Some(&employee));
        prop_assert_eq!(&first, &second);
        prop_assert!(first.hours >= 0);
        prop_assert!(first.minutes >= 0);
        prop_assert!(first.total_hours >= rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn test_automatic_break_respects_cap(
        span_minutes in 0i64..(24 * 60),
        cap in prop::option::of(0u32..120),
    ) {
        let start = make_datetime("2026-01-15", "08:00:00");
        let end = start + Duration::minutes(span_minutes);
        let minutes = automatic_break_minutes(start, Some(end), cap);

        let effective_cap = cap.filter(|c| *c > 0).unwrap_or(DEFAULT_MAX_BREAK_MINUTES);
        prop_assert!(minutes <= effective_cap);
        if span_minutes < BREAK_BLOCK_HOURS * 60 {
            prop_assert_eq!(minutes, 0);
        }
    }
}
