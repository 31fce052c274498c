use bitplist::diff::is_rounding_noise;
use bitplist::{diff, parse, plist, DiffOptions, Differ, IssueKind, PlistMap, Value};
use std::collections::HashSet;

fn dict(value: Value) -> PlistMap {
    match value {
        Value::Dict(map) => map,
        other => panic!("expected dict, got {}", other.type_name()),
    }
}

fn no_skip() -> HashSet<String> {
    HashSet::new()
}

fn reference_state() -> PlistMap {
    dict(plist!({
        "step": 120,
        "time": 1.2,
        "solver": {"name": "rk4", "adaptive": true, "tol": [1e-6, 1e-9]},
        "cells": [
            {"id": 0, "mass": 1.0},
            {"id": 1, "mass": 2.0}
        ]
    }))
}

#[test]
fn test_reflexive() {
    let state = reference_state();
    let copy = state.clone();
    assert_eq!(diff(&state, &copy, &no_skip()), 0);
    assert_eq!(diff(&state, &state, &no_skip()), 0);
}

#[test]
fn test_injected_faults_are_detected() {
    let base = reference_state();

    let mut changed_leaf = base.clone();
    changed_leaf.insert("step".to_string(), Value::Int(121));
    assert!(diff(&base, &changed_leaf, &no_skip()) > 0);

    let mut changed_type = base.clone();
    changed_type.insert("time".to_string(), Value::from("1.2"));
    assert!(diff(&base, &changed_type, &no_skip()) > 0);

    let mut changed_length = base.clone();
    changed_length.insert("cells".to_string(), plist!([{"id": 0, "mass": 1.0}]));
    assert!(diff(&base, &changed_length, &no_skip()) > 0);

    let mut removed = base.clone();
    removed.remove("solver");
    assert!(diff(&base, &removed, &no_skip()) > 0);

    let mut added = base.clone();
    added.insert("extra".to_string(), Value::Bool(false));
    assert!(diff(&base, &added, &no_skip()) > 0);
}

#[test]
fn test_deep_issue_is_reported_at_every_level() {
    let reference = reference_state();
    let mut candidate = reference.clone();
    candidate
        .get_mut("solver")
        .and_then(Value::as_dict_mut)
        .unwrap()
        .insert("name".to_string(), Value::from("euler"));

    let report = Differ::default().diff(&reference, &candidate, &no_skip());
    let found: Vec<_> = report.details.iter().map(|i| (i.kind, i.path.as_str())).collect();
    assert_eq!(
        found,
        vec![
            (IssueKind::ValueMismatch, "solver.name"),
            (IssueKind::NestedMismatch, "solver"),
        ]
    );
    assert_eq!(report.details[0].message, "string \"rk4\" vs \"euler\"");
}

#[test]
fn test_rounding_noise_is_minor() {
    let reference = dict(plist!({"energy": 1.000000000000}));
    let noisy = dict(plist!({"energy": 1.000000000001}));
    let diverged = dict(plist!({"energy": 1.01}));

    let report = Differ::default().diff(&reference, &noisy, &no_skip());
    assert_eq!(report.issues, 1);
    assert_eq!(report.minor_issues(), 1);
    assert_eq!(report.major_issues(), 0);

    let report = Differ::default().diff(&reference, &diverged, &no_skip());
    assert_eq!(report.issues, 1);
    assert_eq!(report.major_issues(), 1);
}

#[test]
fn test_significant_digits_knob() {
    let reference = dict(plist!({"x": 1.0}));
    let candidate = dict(plist!({"x": 1.0001}));

    let strict = Differ::new(DiffOptions::new()).diff(&reference, &candidate, &no_skip());
    assert_eq!(strict.major_issues(), 1);

    let loose = Differ::new(DiffOptions::new().with_significant_digits(3)).diff(&reference, &candidate, &no_skip());
    assert_eq!(loose.minor_issues(), 1);
    assert!(is_rounding_noise(1.0, 1.0001, 3));
}

#[test]
fn test_rate_limited_messages() {
    let reference: Vec<Value> = (0..100).map(|i| Value::Real(i as f64)).collect();
    let candidate: Vec<Value> = (0..100).map(|i| Value::Real(i as f64 + 0.5)).collect();
    let mut a = PlistMap::new();
    a.insert("samples".to_string(), Value::List(reference));
    let mut b = PlistMap::new();
    b.insert("samples".to_string(), Value::List(candidate));

    let options = DiffOptions::new();
    let max_repeats = options.max_repeats;
    let report = Differ::new(options).diff(&a, &b, &no_skip());

    assert_eq!(report.issues, 100);
    assert_eq!(report.messages.len(), max_repeats + 1);
    assert_eq!(report.messages[0], "samples[0]: real 0.0 vs 0.5");
    assert_eq!(
        report.messages[max_repeats],
        format!("samples[]: {} additional value mismatch messages suppressed", 100 - max_repeats)
    );
}

#[test]
fn test_rate_limited_messages_on_array_of_dicts() {
    let cells = |offset: f64| -> Value {
        Value::List(
            (0..100)
                .map(|i| plist!({"id": i, "mass": (Value::Real(f64::from(i) + offset))}))
                .collect(),
        )
    };
    let mut a = PlistMap::new();
    a.insert("cells".to_string(), cells(0.0));
    let mut b = PlistMap::new();
    b.insert("cells".to_string(), cells(0.5));

    let options = DiffOptions::new();
    let max_repeats = options.max_repeats;
    let report = Differ::new(options).diff(&a, &b, &no_skip());

    assert_eq!(report.issues, 200);
    assert_eq!(report.messages.len(), 2 * (max_repeats + 1));
    assert_eq!(report.messages[0], "cells[0].mass: real 0.0 vs 0.5");
    assert_eq!(report.messages[1], "cells[0]: 1 nested issue(s)");
    assert_eq!(
        &report.messages[2 * max_repeats..],
        &[
            format!("cells[].mass: {} additional value mismatch messages suppressed", 100 - max_repeats),
            format!("cells[]: {} additional nested mismatch messages suppressed", 100 - max_repeats),
        ]
    );
}

#[test]
fn test_rate_limiter_mixes_kinds_below_one_array() {
    let reference = dict(plist!({
        "cells": [{"a": 1}, {"a": 1}, {"a": 1}, {"a": 1}],
        "after": 1
    }));
    let candidate = dict(plist!({
        "cells": [{"a": 2}, {"a": "x"}, {"a": 2}, {"a": "y"}],
        "after": 2
    }));
    let report = Differ::new(DiffOptions::new().with_max_repeats(1)).diff(&reference, &candidate, &no_skip());

    assert_eq!(report.issues, 9);
    assert_eq!(
        report.messages,
        vec![
            "cells[0].a: integer 1 vs 2",
            "cells[0]: 1 nested issue(s)",
            "cells[1].a: integer vs string",
            "cells[].a: 1 additional value mismatch messages suppressed",
            "cells[]: 3 additional nested mismatch messages suppressed",
            "cells[].a: 1 additional type mismatch messages suppressed",
            "after: integer 1 vs 2",
        ]
    );
}

#[test]
fn test_rate_limiter_is_per_call() {
    let a = dict(plist!({"xs": [1, 2, 3, 4]}));
    let b = dict(plist!({"xs": [0, 0, 0, 0]}));
    let differ = Differ::new(DiffOptions::new().with_max_repeats(2));

    let first = differ.diff(&a, &b, &no_skip());
    let second = differ.diff(&a, &b, &no_skip());
    assert_eq!(first.messages, second.messages);
    assert_eq!(first.messages.len(), 3);
}

#[test]
fn test_interleaved_runs_restart() {
    let a = dict(plist!({"p": [1, 2, 3], "q": [1, 2, 3], "r": [1, 2, 3]}));
    let b = dict(plist!({"p": [0, 0, 0], "q": [0, 0, 0], "r": [0, 0, 0]}));
    let report = Differ::new(DiffOptions::new().with_max_repeats(1)).diff(&a, &b, &no_skip());
    assert_eq!(report.issues, 9);
    assert_eq!(
        report.messages,
        vec![
            "p[0]: integer 1 vs 0",
            "p[]: 2 additional value mismatch messages suppressed",
            "q[0]: integer 1 vs 0",
            "q[]: 2 additional value mismatch messages suppressed",
            "r[0]: integer 1 vs 0",
            "r[]: 2 additional value mismatch messages suppressed",
        ]
    );
}

#[test]
fn test_skip_keys() {
    let reference = dict(plist!({"wallclock": 12.5, "host": "a", "x": 1}));
    let candidate = dict(plist!({"wallclock": 99.0, "x": 1, "pid": 7}));
    let skip: HashSet<String> = ["wallclock", "host", "pid"].iter().map(|s| s.to_string()).collect();
    assert_eq!(diff(&reference, &candidate, &skip), 0);
    assert_eq!(diff(&reference, &candidate, &no_skip()), 3);
}

#[test]
fn test_fail_fast() {
    let reference = reference_state();
    let candidate = dict(plist!({
        "step": 0,
        "time": 0.0,
        "solver": {},
        "cells": []
    }));
    let full = Differ::default().diff(&reference, &candidate, &no_skip());
    let fast = Differ::new(DiffOptions::new().with_fail_fast(true)).diff(&reference, &candidate, &no_skip());
    assert!(full.issues > 1);
    assert_eq!(fast.issues, 1);
    assert_eq!(fast.details[0].path, "step");
}

#[test]
fn test_subset_comparison() {
    let reference = reference_state();
    let candidate = dict(plist!({"step": 120}));
    let differ = Differ::new(DiffOptions::new().with_reference_only_keys(true));
    assert!(differ.diff(&reference, &candidate, &no_skip()).is_clean());

    let strict = Differ::default().diff(&reference, &candidate, &no_skip());
    assert_eq!(strict.issues, 3);
    assert!(strict.details.iter().all(|i| i.kind == IssueKind::MissingInCandidate));
}

#[test]
fn test_decimal_and_bit_pattern_documents_agree() {
    let bits = parse("<dict><key>x</key><real>4609434218613702656L</real></dict>");
    let decimal = parse("<dict><key>x</key><real>1.5</real></dict>");
    assert_eq!(diff(&bits, &decimal, &no_skip()), 0);
}
