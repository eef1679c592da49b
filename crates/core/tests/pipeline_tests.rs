//! End-to-end tests for resolve, schedule and flatten

use chrono::{Days, NaiveDate};
use ganttgen_core::plan::{Milestone, Plan, WorkPackage};
use ganttgen_core::{DateSpan, Error, RenderRow, RowKind, SchedulerConfig, run};
use std::num::NonZeroU32;

fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(n)
}

fn wp(days: u32) -> WorkPackage {
    WorkPackage::new(NonZeroU32::new(days).unwrap())
}

fn span_of(rows: &[RenderRow], id: &str) -> DateSpan {
    rows.iter()
        .find(|r| r.id == id)
        .and_then(|r| r.span)
        .unwrap_or_else(|| panic!("no span for {id}"))
}

fn release_plan() -> Plan {
    let mut plan = Plan::new("Release").with_start_date(day(0));
    let design = plan.add_group(None, "design", "Design");
    plan.add_work_package(Some(design), "research", "Research", wp(3));
    let mockups = wp(2).after(["research"]);
    plan.add_work_package(Some(design), "mockups", "Mockups", mockups);

    let build = plan.add_group(None, "build", "Build");
    let backend = plan.add_group(Some(build), "backend", "Backend");
    plan.add_work_package(Some(backend), "api", "API", wp(5).after(["mockups"]));
    let frontend = wp(4).after(["mockups"]);
    plan.add_work_package(Some(build), "frontend", "Frontend", frontend);
    plan.add_milestone(
        Some(build),
        "launch",
        "Launch",
        Milestone::default().after(["api", "frontend"]),
    );
    plan
}

#[test]
fn test_duplicate_identifiers_stop_the_run() {
    let mut plan = Plan::new("p").with_start_date(day(0));
    let a = plan.add_group(None, "a", "A");
    let b = plan.add_group(None, "b", "B");
    plan.add_work_package(Some(a), "task", "Task", wp(1));
    plan.add_work_package(Some(b), "task", "Task again", wp(1));

    let err = run(&plan, &SchedulerConfig::default()).unwrap_err();
    assert!(matches!(err, Error::DuplicateIdentifier { ref id, .. } if id == "task"));
}

#[test]
fn test_unknown_dependency_before_dates() {
    // No anchor date anywhere: a date computation would fail differently.
    let mut plan = Plan::new("p");
    plan.add_work_package(None, "a", "A", wp(1).after(["ghost"]));

    let err = run(&plan, &SchedulerConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownDependency { ref target, .. } if target == "ghost"
    ));
}

#[test]
fn test_cycle_reports_trace() {
    let mut plan = Plan::new("p").with_start_date(day(0));
    plan.add_work_package(None, "a", "A", wp(1).after(["c"]));
    plan.add_work_package(None, "b", "B", wp(1).after(["a"]));
    plan.add_work_package(None, "c", "C", wp(1).after(["b"]));

    match run(&plan, &SchedulerConfig::default()).unwrap_err() {
        Error::CyclicDependency { cycle } => {
            assert_eq!(cycle.first(), cycle.last());
            assert_eq!(cycle.len(), 4);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_precedence_violation() {
    let mut plan = Plan::new("p");
    plan.add_work_package(None, "a", "A", wp(3).starting(day(0)));
    plan.add_work_package(None, "b", "B", wp(1).starting(day(1)).after(["a"]));

    let err = run(&plan, &SchedulerConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::PrecedenceViolation { ref id, ref dependency, required_start, actual_start }
            if id == "b" && dependency == "a" && required_start == day(3) && actual_start == day(1)
    ));
}

#[test]
fn test_inference() {
    let mut plan = Plan::new("p");
    plan.add_work_package(None, "a", "A", wp(3).starting(day(0)));
    plan.add_work_package(None, "b", "B", wp(2).after(["a"]));

    let scheduled = run(&plan, &SchedulerConfig::default()).unwrap();
    assert_eq!(span_of(&scheduled.rows, "b"), DateSpan::new(day(3), day(5)));
}

#[test]
fn test_group_span_independent_of_child_order() {
    for flipped in [false, true] {
        let mut plan = Plan::new("p");
        let group = plan.add_group(None, "g", "G");
        let first = ("x", wp(3).starting(day(0)));
        let second = ("y", wp(3).starting(day(2)));
        let (one, two) = if flipped { (second, first) } else { (first, second) };
        plan.add_work_package(Some(group), one.0, one.0, one.1);
        plan.add_work_package(Some(group), two.0, two.0, two.1);

        let scheduled = run(&plan, &SchedulerConfig::default()).unwrap();
        assert_eq!(span_of(&scheduled.rows, "g"), DateSpan::new(day(0), day(5)));
    }
}

#[test]
fn test_milestone_has_zero_slack() {
    let mut plan = Plan::new("p");
    plan.add_work_package(None, "a", "A", wp(5).starting(day(0)));
    plan.add_milestone(None, "m", "M", Milestone::default().after(["a"]));

    let scheduled = run(&plan, &SchedulerConfig::default()).unwrap();
    assert_eq!(span_of(&scheduled.rows, "m"), DateSpan::point(day(5)));
}

#[test]
fn test_full_plan_rows() {
    let plan = release_plan();
    let scheduled = run(&plan, &SchedulerConfig::default()).unwrap();

    let ids: Vec<&str> = scheduled.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "design", "research", "mockups", "build", "backend", "api", "frontend", "launch"
        ]
    );

    let rows = &scheduled.rows;
    assert_eq!(span_of(rows, "mockups"), DateSpan::new(day(3), day(5)));
    assert_eq!(span_of(rows, "api"), DateSpan::new(day(5), day(10)));
    assert_eq!(span_of(rows, "frontend"), DateSpan::new(day(5), day(9)));
    assert_eq!(span_of(rows, "launch"), DateSpan::point(day(10)));
    assert_eq!(span_of(rows, "build"), DateSpan::new(day(5), day(10)));
    assert_eq!(scheduled.span, Some(DateSpan::new(day(0), day(10))));

    let backend = rows.iter().find(|r| r.id == "backend").unwrap();
    assert_eq!(backend.kind, RowKind::Group);
    assert_eq!(backend.depth, 1);
    assert_eq!(backend.category.as_deref(), Some("build"));
}

#[test]
fn test_runs_are_deterministic() {
    let plan = release_plan();
    let first = run(&plan, &SchedulerConfig::default()).unwrap();
    let second = run(&plan, &SchedulerConfig::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rows_serialize_to_json() {
    let plan = release_plan();
    let scheduled = run(&plan, &SchedulerConfig::default()).unwrap();
    let json = serde_json::to_value(&scheduled.rows[2]).unwrap();

    assert_eq!(json["id"], "mockups");
    assert_eq!(json["kind"], "work_package");
    assert_eq!(json["span"]["start"], "2024-01-04");
    assert_eq!(json["span"]["end"], "2024-01-06");
    assert_eq!(json["depends_on"][0], "research");
}

#[test]
fn test_empty_plan() {
    let plan = Plan::new("empty");
    let scheduled = run(&plan, &SchedulerConfig::default()).unwrap();
    assert!(scheduled.rows.is_empty());
    assert_eq!(scheduled.span, None);
}
