//! Structural comparison of two value trees.
//!
//! [`Differ`] walks a reference and a candidate dictionary depth-first and
//! reports every discrepancy as an [`Issue`]. Real mismatches that only differ
//! in the last significant digit are still reported, but are also tallied as
//! numerical so callers can tell float noise from real divergence.
//!
//! ```rust
//! use bitplist::{plist, Differ, DiffOptions};
//! use std::collections::HashSet;
//!
//! let reference = plist!({"t": 1.0, "cells": [1, 2]});
//! let candidate = plist!({"t": 1.000000000001, "cells": [1, 3]});
//!
//! let report = Differ::new(DiffOptions::new()).diff(
//!     reference.as_dict().unwrap(),
//!     candidate.as_dict().unwrap(),
//!     &HashSet::new(),
//! );
//! assert_eq!(report.issues, 2);
//! assert_eq!(report.minor_issues(), 1);
//! assert_eq!(report.major_issues(), 1);
//! assert_eq!(report.details[1].path, "cells[1]");
//! ```
//!
//! ## Diagnostics
//!
//! Each issue produces one message, logged through `tracing` and collected in
//! [`DiffReport::messages`]. Consecutive issues below the same top-level
//! array form a run, whatever their kind. Within a run, each kind at each
//! place in the tree (array indices ignored) emits its first `max_repeats`
//! messages; the rest are counted and summarized in one line each when the
//! run ends. All of that state is created per call, so a `Differ` can be
//! shared freely.

use crate::{DiffOptions, PlistMap, Value};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

/// Classification of a single discrepancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Key present in the candidate only.
    MissingInReference,
    /// Key present in the reference only.
    MissingInCandidate,
    /// Same key, different variants.
    TypeMismatch,
    /// Arrays of different lengths.
    LengthMismatch,
    /// Same variant, different leaf value.
    ValueMismatch,
    /// A dictionary whose subtree holds at least one issue.
    NestedMismatch,
}

impl IssueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            IssueKind::MissingInReference => "missing in reference",
            IssueKind::MissingInCandidate => "missing in candidate",
            IssueKind::TypeMismatch => "type mismatch",
            IssueKind::LengthMismatch => "length mismatch",
            IssueKind::ValueMismatch => "value mismatch",
            IssueKind::NestedMismatch => "nested mismatch",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded discrepancy.
#[derive(Clone, Debug, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    /// Location such as `state.cells[3].mass`.
    pub path: String,
    pub message: String,
    /// Set when the issue is a real mismatch within rounding noise, or a
    /// nested mismatch whose subtree holds nothing else.
    pub numerical: bool,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of one [`Differ::diff`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffReport {
    /// Total number of recorded issues.
    pub issues: usize,
    /// Issues classified as rounding noise.
    pub numerical_issues: usize,
    /// Every recorded issue, in discovery order.
    pub details: Vec<Issue>,
    /// Emitted diagnostic lines, after rate limiting.
    pub messages: Vec<String>,
}

impl DiffReport {
    /// Structural, type and value mismatches.
    #[must_use]
    pub fn major_issues(&self) -> usize {
        self.issues - self.numerical_issues
    }

    /// Mismatches explained by rounding noise.
    #[must_use]
    pub fn minor_issues(&self) -> usize {
        self.numerical_issues
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues == 0
    }
}

/// Returns `true` when `candidate` agrees with `reference` to
/// `significant_digits`, give or take one unit in the last digit.
///
/// The scale is taken from the magnitude of `reference`. Non-finite inputs
/// are never noise.
///
/// ```rust
/// use bitplist::diff::is_rounding_noise;
///
/// assert!(is_rounding_noise(1.0, 1.000000000001, 12));
/// assert!(!is_rounding_noise(1.0, 1.01, 12));
/// assert!(is_rounding_noise(1234.5, 1234.51, 5));
/// ```
#[must_use]
pub fn is_rounding_noise(reference: f64, candidate: f64, significant_digits: i32) -> bool {
    if !reference.is_finite() || !candidate.is_finite() {
        return false;
    }
    let order = (1.0 + reference.abs()).log10().floor() as i32;
    let scale = 10f64.powi(significant_digits - order);
    let distance = (reference * scale).floor() - (candidate * scale).floor();
    distance.abs() <= 1.0
}

fn reals_equal(a: f64, b: f64) -> bool {
    a == b || a.to_bits() == b.to_bits()
}

fn key_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// `cells[3].mass` -> `cells[].mass`; runs of array elements share a shape.
fn path_shape(path: &str) -> String {
    let mut shape = String::with_capacity(path.len());
    let mut in_index = false;
    for ch in path.chars() {
        match ch {
            '[' => {
                in_index = true;
                shape.push('[');
            }
            ']' => {
                in_index = false;
                shape.push(']');
            }
            _ if in_index => {}
            _ => shape.push(ch),
        }
    }
    shape
}

/// The part of a shape up to its first array, or the whole shape when it
/// holds none. Issues anywhere below one array share a run.
fn run_scope(shape: &str) -> &str {
    match shape.find("[]") {
        Some(at) => &shape[..at + 2],
        None => shape,
    }
}

/// Rate limiter for diagnostic lines, scoped to one comparison.
///
/// A run lasts while consecutive issues share a [`run_scope`]. Inside a run,
/// each (kind, shape) pair gets its own `max_repeats` allowance and its own
/// summary when the run closes.
struct Diagnostics {
    max_repeats: usize,
    verbose: bool,
    scope: Option<String>,
    counts: IndexMap<(IssueKind, String), (usize, usize)>,
    messages: Vec<String>,
}

impl Diagnostics {
    fn new(options: &DiffOptions) -> Self {
        Diagnostics {
            max_repeats: options.max_repeats,
            verbose: options.verbose,
            scope: None,
            counts: IndexMap::new(),
            messages: Vec::new(),
        }
    }

    fn emit(&mut self, issue: &Issue) {
        let shape = path_shape(&issue.path);
        if self.scope.as_deref() != Some(run_scope(&shape)) {
            self.flush();
            self.scope = Some(run_scope(&shape).to_string());
        }
        let (seen, suppressed) = self.counts.entry((issue.kind, shape)).or_insert((0, 0));
        *seen += 1;
        if *seen > self.max_repeats {
            *suppressed += 1;
            return;
        }
        self.log(issue.to_string());
    }

    /// Closes the current run, summarizing whatever it suppressed.
    fn flush(&mut self) {
        let summaries: Vec<String> = self
            .counts
            .drain(..)
            .filter(|(_, (_, suppressed))| *suppressed > 0)
            .map(|((kind, shape), (_, suppressed))| {
                format!("{}: {} additional {} messages suppressed", shape, suppressed, kind)
            })
            .collect();
        for line in summaries {
            self.log(line);
        }
    }

    fn log(&mut self, line: String) {
        if self.verbose {
            tracing::info!("{line}");
        } else {
            tracing::debug!("{line}");
        }
        self.messages.push(line);
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.messages
    }
}

/// Mutable state of one comparison.
struct Comparison<'a> {
    options: &'a DiffOptions,
    skip: &'a HashSet<String>,
    diagnostics: Diagnostics,
    report: DiffReport,
    halted: bool,
}

impl<'a> Comparison<'a> {
    fn record(&mut self, kind: IssueKind, path: String, message: String, numerical: bool) {
        let issue = Issue {
            kind,
            path,
            message,
            numerical,
        };
        self.report.issues += 1;
        if numerical {
            self.report.numerical_issues += 1;
        }
        self.diagnostics.emit(&issue);
        self.report.details.push(issue);
        if self.options.fail_fast {
            self.halted = true;
        }
    }

    fn compare_dicts(
        &mut self,
        path: &str,
        reference: &PlistMap,
        candidate: &PlistMap,
        tolerate_reference_only: bool,
    ) {
        for key in candidate.keys() {
            if self.skip.contains(key) || reference.contains_key(key) {
                continue;
            }
            self.record(
                IssueKind::MissingInReference,
                key_path(path, key),
                IssueKind::MissingInReference.to_string(),
                false,
            );
            if self.halted {
                return;
            }
        }

        for (key, expected) in reference.iter() {
            if self.skip.contains(key) {
                continue;
            }
            match candidate.get(key) {
                Some(actual) => self.compare_values(&key_path(path, key), expected, actual),
                None if tolerate_reference_only => {}
                None => self.record(
                    IssueKind::MissingInCandidate,
                    key_path(path, key),
                    IssueKind::MissingInCandidate.to_string(),
                    false,
                ),
            }
            if self.halted {
                return;
            }
        }
    }

    fn compare_values(&mut self, path: &str, reference: &Value, candidate: &Value) {
        match (reference, candidate) {
            (Value::Dict(expected), Value::Dict(actual)) => {
                let issues = self.report.issues;
                let numerical = self.report.numerical_issues;
                self.compare_dicts(path, expected, actual, false);
                let nested = self.report.issues - issues;
                if nested > 0 && !self.halted {
                    let only_noise = self.report.numerical_issues - numerical == nested;
                    self.record(
                        IssueKind::NestedMismatch,
                        path.to_string(),
                        format!("{} nested issue(s)", nested),
                        only_noise,
                    );
                }
            }
            (Value::List(expected), Value::List(actual)) => {
                if expected.len() != actual.len() {
                    self.record(
                        IssueKind::LengthMismatch,
                        path.to_string(),
                        format!("array length {} vs {}", expected.len(), actual.len()),
                        false,
                    );
                    return;
                }
                for (index, (a, b)) in expected.iter().zip(actual).enumerate() {
                    self.compare_values(&index_path(path, index), a, b);
                    if self.halted {
                        return;
                    }
                }
            }
            (Value::Real(a), Value::Real(b)) => {
                if !reals_equal(*a, *b) {
                    let noise = is_rounding_noise(*a, *b, self.options.significant_digits);
                    let message = if noise {
                        format!("real {:?} vs {:?} (rounding noise)", a, b)
                    } else {
                        format!("real {:?} vs {:?}", a, b)
                    };
                    self.record(IssueKind::ValueMismatch, path.to_string(), message, noise);
                }
            }
            (Value::Str(a), Value::Str(b)) if a != b => self.value_mismatch(path, reference, candidate),
            (Value::Int(a), Value::Int(b)) if a != b => self.value_mismatch(path, reference, candidate),
            (Value::Bool(a), Value::Bool(b)) if a != b => self.value_mismatch(path, reference, candidate),
            (Value::Str(_), Value::Str(_))
            | (Value::Int(_), Value::Int(_))
            | (Value::Bool(_), Value::Bool(_)) => {}
            _ => self.record(
                IssueKind::TypeMismatch,
                path.to_string(),
                format!("{} vs {}", reference.type_name(), candidate.type_name()),
                false,
            ),
        }
    }

    fn value_mismatch(&mut self, path: &str, reference: &Value, candidate: &Value) {
        self.record(
            IssueKind::ValueMismatch,
            path.to_string(),
            format!("{} {} vs {}", reference.type_name(), reference, candidate),
            false,
        );
    }
}

/// Compares value trees.
///
/// A `Differ` only holds configuration; every [`diff`](Differ::diff) call
/// starts from fresh counters and a fresh rate limiter.
#[derive(Clone, Debug, Default)]
pub struct Differ {
    options: DiffOptions,
}

impl Differ {
    pub fn new(options: DiffOptions) -> Self {
        Differ { options }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Compares `candidate` against `reference`, ignoring any key in `skip`
    /// at every depth.
    ///
    /// Keys only found in `reference` are accepted when both arguments are
    /// the same dictionary or when
    /// [`allow_reference_only_keys`](DiffOptions::allow_reference_only_keys) is set.
    pub fn diff(&self, reference: &PlistMap, candidate: &PlistMap, skip: &HashSet<String>) -> DiffReport {
        let tolerate_reference_only =
            self.options.allow_reference_only_keys || std::ptr::eq(reference, candidate);
        let mut comparison = Comparison {
            options: &self.options,
            skip,
            diagnostics: Diagnostics::new(&self.options),
            report: DiffReport::default(),
            halted: false,
        };
        comparison.compare_dicts("", reference, candidate, tolerate_reference_only);

        let Comparison {
            diagnostics,
            mut report,
            ..
        } = comparison;
        report.messages = diagnostics.finish();
        tracing::debug!(
            issues = report.issues,
            numerical = report.numerical_issues,
            "comparison finished"
        );
        report
    }
}

/// Compares two trees with default options and returns the issue count.
///
/// ```rust
/// use bitplist::{diff, plist};
/// use std::collections::HashSet;
///
/// let a = plist!({"seed": 1, "x": 0.5});
/// let b = plist!({"seed": 2, "x": 0.5});
/// let skip: HashSet<String> = ["seed".to_string()].into();
/// assert_eq!(diff(a.as_dict().unwrap(), b.as_dict().unwrap(), &skip), 0);
/// ```
#[must_use]
pub fn diff(reference: &PlistMap, candidate: &PlistMap, skip: &HashSet<String>) -> usize {
    Differ::default().diff(reference, candidate, skip).issues
}
