//! # Compare Module
//!
//! Decides whether an observed call log matches an expected call sequence.
//!
//! Comparison is always against the *whole* log. Asserting that one spy was
//! called with some arguments therefore also asserts that nothing else was
//! called, so stray side effects cannot slip through a test unnoticed.
//!
//! The [`Comparator`] adds a structured list of [`Difference`]s and the
//! diagnostic message shown when a test fails.

use crate::recorder::CallRecord;
use crate::value::{deep_equals, Value};
use colored::Colorize;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Pluggable value equality used by the comparator.
pub type Equality = Rc<dyn Fn(&Value, &Value) -> bool>;

/// Returns true if `observed` equals `expected` as ordered call sequences.
///
/// Each expected entry must be a list `[name, receiver?, ...args]`. It is
/// compared element-wise, under `equals`, with the flattened observed record.
/// Extra or missing calls are mismatches.
///
/// # Example
///
/// ```rust
/// use strict_spies_core::{args, calls, Recorder};
/// use strict_spies_core::compare::matches_all;
/// use strict_spies_core::value::deep_equals;
///
/// let spies = Recorder::new();
/// spies.create("cb").call(args!["hello", "world"]);
///
/// assert!(matches_all(&spies.calls(), &calls![["cb", "hello", "world"]], deep_equals));
/// assert!(!matches_all(&spies.calls(), &calls![], deep_equals));
/// ```
pub fn matches_all<F>(observed: &[CallRecord], expected: &[Value], equals: F) -> bool
where
    F: Fn(&Value, &Value) -> bool,
{
    observed.len() == expected.len()
        && observed
            .iter()
            .zip(expected)
            .all(|(record, expected)| records_equal(&record.to_values(), expected, &equals))
}

/// Returns true if the log holds exactly one call, to `name` with
/// `expected_args`.
///
/// Calls to any other spy sharing the recorder make this fail.
pub fn matches_single<F>(
    observed: &[CallRecord],
    name: &str,
    expected_args: &[Value],
    equals: F,
) -> bool
where
    F: Fn(&Value, &Value) -> bool,
{
    matches_all(observed, &[single_call(name, expected_args)], equals)
}

/// Returns true if the log is non-empty.
pub fn has_any_calls(observed: &[CallRecord]) -> bool {
    !observed.is_empty()
}

/// Builds the expected record `[name, ...args]`.
pub fn single_call(name: &str, args: &[Value]) -> Value {
    let mut record = Vec::with_capacity(args.len() + 1);
    record.push(Value::from(name));
    record.extend(args.iter().cloned());
    Value::List(record)
}

fn records_equal(
    observed: &[Value],
    expected: &Value,
    equals: &dyn Fn(&Value, &Value) -> bool,
) -> bool {
    match expected.as_list() {
        Some(expected) => {
            observed.len() == expected.len()
                && observed.iter().zip(expected).all(|(a, b)| equals(a, b))
        }
        None => false,
    }
}

/// Renders a call sequence with one record per line.
pub fn render_calls(calls: &[Value]) -> String {
    if calls.is_empty() {
        return "[]".to_string();
    }

    let mut lines = Vec::with_capacity(calls.len() + 2);
    lines.push("[".to_string());
    for call in calls {
        lines.push(format!("  {call},"));
    }
    lines.push("]".to_string());
    lines.join("\n")
}

/// Describes how an observed log differs from the expected one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DifferenceKind {
    /// The logs have different lengths.
    CountMismatch {
        /// Number of observed calls.
        observed: usize,
        /// Number of expected calls.
        expected: usize,
    },

    /// A call at the same position differs.
    RecordMismatch {
        index: usize,
        observed: Value,
        expected: Value,
    },

    /// A call was observed past the end of the expected sequence.
    Unexpected { index: usize, observed: Value },

    /// An expected call never happened.
    Missing { index: usize, expected: Value },
}

/// A single difference between observed and expected calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    /// The kind of difference detected.
    pub kind: DifferenceKind,

    /// Human-readable one-line summary.
    pub summary: String,
}

impl Difference {
    fn new(kind: DifferenceKind) -> Self {
        let summary = match &kind {
            DifferenceKind::CountMismatch { observed, expected } => {
                format!("expected {expected} call(s), observed {observed}")
            }
            DifferenceKind::RecordMismatch {
                index,
                observed,
                expected,
            } => format!("call #{index}: observed {observed}, expected {expected}"),
            DifferenceKind::Unexpected { index, observed } => {
                format!("call #{index}: unexpected {observed}")
            }
            DifferenceKind::Missing { index, expected } => {
                format!("call #{index}: missing {expected}")
            }
        };
        Self { kind, summary }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

/// Output format for mismatch reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// The full [`Comparison`] as pretty-printed JSON.
    Json,
}

/// Configuration for the comparator.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    /// How mismatch reports are rendered.
    pub format: ReportFormat,

    /// Whether text reports use terminal colors. Colors are forced on even
    /// when stdout is not a terminal.
    pub color: bool,

    /// Maximum number of differences listed in a text report.
    pub max_differences: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            color: false,
            max_differences: 10,
        }
    }
}

/// Outcome of comparing a call log against an expected sequence.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    /// Whether the log matched.
    pub pass: bool,

    /// The observed calls, flattened to `[name, receiver?, ...args]`.
    pub observed: Vec<Value>,

    /// The expected calls.
    pub expected: Vec<Value>,

    /// Every difference found, in log order.
    pub differences: Vec<Difference>,
}

/// Compares call logs against expectations and renders mismatch reports.
///
/// # Example
///
/// ```rust
/// use strict_spies_core::{args, calls, Comparator, Recorder};
///
/// let spies = Recorder::new();
/// spies.create("cb").call(args!["hello"]);
///
/// let comparator = Comparator::new();
/// let comparison = comparator.compare(&spies.calls(), &calls![["cb", "world"]]);
///
/// assert!(!comparison.pass);
/// assert!(comparator.report(&comparison).starts_with("Expected calls"));
/// ```
#[derive(Clone)]
pub struct Comparator {
    config: CompareConfig,
    equals: Equality,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Comparator {
    /// Creates a comparator using [`deep_equals`] and the default configuration.
    pub fn new() -> Self {
        Self::with_config(CompareConfig::default())
    }

    /// Creates a comparator with the given configuration.
    pub fn with_config(config: CompareConfig) -> Self {
        Self {
            config,
            equals: Rc::new(deep_equals),
        }
    }

    /// Replaces the value equality used for record elements.
    pub fn with_equality<F>(mut self, equals: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + 'static,
    {
        self.equals = Rc::new(equals);
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Returns true if `a` and `b` are equal under this comparator.
    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        (self.equals)(a, b)
    }

    /// Compares the whole log against `expected`.
    pub fn compare(&self, observed: &[CallRecord], expected: &[Value]) -> Comparison {
        let observed: Vec<Value> = observed.iter().map(Value::from).collect();
        let mut differences = Vec::new();

        if observed.len() != expected.len() {
            differences.push(Difference::new(DifferenceKind::CountMismatch {
                observed: observed.len(),
                expected: expected.len(),
            }));
        }

        let max_len = observed.len().max(expected.len());
        for index in 0..max_len {
            match (observed.get(index), expected.get(index)) {
                (Some(o), Some(e)) => {
                    let flattened = o.as_list().unwrap_or_default();
                    if !records_equal(flattened, e, &*self.equals) {
                        differences.push(Difference::new(DifferenceKind::RecordMismatch {
                            index,
                            observed: o.clone(),
                            expected: e.clone(),
                        }));
                    }
                }
                (Some(o), None) => {
                    differences.push(Difference::new(DifferenceKind::Unexpected {
                        index,
                        observed: o.clone(),
                    }));
                }
                (None, Some(e)) => {
                    differences.push(Difference::new(DifferenceKind::Missing {
                        index,
                        expected: e.clone(),
                    }));
                }
                (None, None) => unreachable!(),
            }
        }

        let pass = differences.is_empty();
        if !pass {
            tracing::debug!(
                observed = observed.len(),
                expected = expected.len(),
                differences = differences.len(),
                "spy calls did not match"
            );
        }

        Comparison {
            pass,
            observed,
            expected: expected.to_vec(),
            differences,
        }
    }

    /// Compares the whole log against the single call `[name, ...args]`.
    pub fn compare_single(
        &self,
        observed: &[CallRecord],
        name: &str,
        args: &[Value],
    ) -> Comparison {
        self.compare(observed, &[single_call(name, args)])
    }

    /// Renders the diagnostic message for a comparison.
    pub fn report(&self, comparison: &Comparison) -> String {
        match self.config.format {
            ReportFormat::Text => self.render_text(comparison),
            ReportFormat::Json => serde_json::to_string_pretty(comparison)
                .unwrap_or_else(|_| self.render_text(comparison)),
        }
    }

    fn render_text(&self, comparison: &Comparison) -> String {
        if !self.config.color {
            return self.render_lines(comparison);
        }
        colored::control::set_override(true);
        let text = self.render_lines(comparison);
        colored::control::unset_override();
        text
    }

    fn render_lines(&self, comparison: &Comparison) -> String {
        let mut lines = vec![
            self.paint("Expected calls", Paint::Header),
            self.paint(&render_calls(&comparison.observed), Paint::Observed),
            self.paint("to equal", Paint::Header),
            self.paint(&render_calls(&comparison.expected), Paint::Expected),
        ];

        if !comparison.differences.is_empty() {
            lines.push(String::new());
            lines.push("Differences:".to_string());
            for diff in comparison.differences.iter().take(self.config.max_differences) {
                lines.push(format!("  {diff}"));
            }
            let hidden = comparison
                .differences
                .len()
                .saturating_sub(self.config.max_differences);
            if hidden > 0 {
                lines.push(format!("  ... and {hidden} more"));
            }
        }

        lines.join("\n")
    }

    fn paint(&self, text: &str, paint: Paint) -> String {
        if !self.config.color {
            return text.to_string();
        }
        match paint {
            Paint::Header => text.bold().to_string(),
            Paint::Observed => text.red().to_string(),
            Paint::Expected => text.green().to_string(),
        }
    }
}

#[derive(Clone, Copy)]
enum Paint {
    Header,
    Observed,
    Expected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::Recorder;
    use crate::{args, calls};

    fn recorder_with_calls() -> Recorder {
        let spies = Recorder::new();
        let a = spies.create("a");
        let b = spies.create("b");
        a.call(args![1]);
        b.call(args!["x"]);
        spies
    }

    #[test]
    fn test_matches_all_requires_exact_sequence() {
        let spies = recorder_with_calls();
        let observed = spies.calls();

        assert!(matches_all(&observed, &calls![["a", 1], ["b", "x"]], deep_equals));
        assert!(!matches_all(&observed, &calls![["b", "x"], ["a", 1]], deep_equals));
        assert!(!matches_all(&observed, &calls![["a", 1]], deep_equals));
        assert!(!matches_all(
            &observed,
            &calls![["a", 1], ["b", "x"], ["c"]],
            deep_equals
        ));
    }

    #[test]
    fn test_single_call_is_strict() {
        let spies = recorder_with_calls();

        assert!(!matches_single(&spies.calls(), "a", &args![1], deep_equals));

        spies.reset();
        spies.create("a").call(args![1]);
        assert!(matches_single(&spies.calls(), "a", &args![1], deep_equals));
    }

    #[test]
    fn test_non_list_expectation_never_matches() {
        let spies = Recorder::new();
        spies.create("a").call(args![]);

        assert!(!matches_all(&spies.calls(), &[Value::from("a")], deep_equals));
        assert!(matches_all(&spies.calls(), &calls![["a"]], deep_equals));
    }

    #[test]
    fn test_has_any_calls() {
        let spies = Recorder::new();
        spies.create("unused");
        assert!(!has_any_calls(&spies.calls()));

        let spies = recorder_with_calls();
        assert!(has_any_calls(&spies.calls()));
    }

    #[test]
    fn test_structurally_equal_object_matches() {
        let spies = Recorder::new();
        let payload = Value::shared(Value::object([("hello", "world")]));
        spies.create("cb").call(vec![payload]);

        assert!(matches_all(
            &spies.calls(),
            &calls![["cb", Value::object([("hello", "world")])]],
            deep_equals
        ));
    }

    #[test]
    fn test_custom_equality() {
        let spies = Recorder::new();
        spies.create("cb").call(args!["HELLO"]);

        let case_insensitive = |a: &Value, b: &Value| match (a.as_str(), b.as_str()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => deep_equals(a, b),
        };

        assert!(matches_all(&spies.calls(), &calls![["cb", "hello"]], case_insensitive));

        let comparator = Comparator::new().with_equality(case_insensitive);
        assert!(comparator.compare(&spies.calls(), &calls![["cb", "hello"]]).pass);
    }

    #[test]
    fn test_differences_are_listed() {
        let spies = recorder_with_calls();
        let comparison = Comparator::new().compare(&spies.calls(), &calls![["a", 2]]);

        assert!(!comparison.pass);
        assert_eq!(comparison.differences.len(), 3);
        assert!(matches!(
            comparison.differences[0].kind,
            DifferenceKind::CountMismatch {
                observed: 2,
                expected: 1
            }
        ));
        assert!(matches!(
            comparison.differences[1].kind,
            DifferenceKind::RecordMismatch { index: 0, .. }
        ));
        assert!(matches!(
            comparison.differences[2].kind,
            DifferenceKind::Unexpected { index: 1, .. }
        ));
    }

    #[test]
    fn test_missing_calls() {
        let spies = Recorder::new();
        let comparison = Comparator::new().compare(&spies.calls(), &calls![["a"]]);

        assert!(comparison
            .differences
            .iter()
            .any(|d| matches!(d.kind, DifferenceKind::Missing { index: 0, .. })));
    }

    #[test]
    fn test_text_report() {
        let spies = Recorder::new();
        spies.create("cb").call(args!["hello"]);

        let comparator = Comparator::new();
        let comparison = comparator.compare(&spies.calls(), &calls![["cb", "world"]]);
        let report = comparator.report(&comparison);

        assert!(report.starts_with(
            "Expected calls\n[\n  [ 'cb', 'hello' ],\n]\nto equal\n[\n  [ 'cb', 'world' ],\n]"
        ));
        assert!(report.contains("call #0: observed [ 'cb', 'hello' ], expected [ 'cb', 'world' ]"));
    }

    #[test]
    fn test_report_caps_differences() {
        let spies = Recorder::new();
        let cb = spies.create("cb");
        for i in 0..5 {
            cb.call(args![i]);
        }

        let comparator = Comparator::with_config(CompareConfig {
            max_differences: 2,
            ..Default::default()
        });
        let comparison = comparator.compare(&spies.calls(), &calls![]);
        let report = comparator.report(&comparison);

        assert_eq!(comparison.differences.len(), 6);
        assert!(report.contains("... and 4 more"));
    }

    #[test]
    fn test_json_report() {
        let spies = Recorder::new();
        spies.create("cb").call(args![1]);

        let comparator = Comparator::with_config(CompareConfig {
            format: ReportFormat::Json,
            ..Default::default()
        });
        let comparison = comparator.compare(&spies.calls(), &calls![]);
        let report = comparator.report(&comparison);
        let json: serde_json::Value = serde_json::from_str(&report).unwrap();

        assert_eq!(json["pass"], false);
        assert_eq!(json["observed"], serde_json::json!([["cb", 1]]));
    }

    #[test]
    fn test_colored_report() {
        let spies = Recorder::new();
        spies.create("cb").call(args![1]);

        let colored = Comparator::with_config(CompareConfig {
            color: true,
            ..Default::default()
        });
        let comparison = colored.compare(&spies.calls(), &calls![["cb", 2]]);
        let report = colored.report(&comparison);

        assert!(report.contains("\u{1b}["));
        assert!(report.contains("Expected calls"));
        assert!(!Comparator::new().report(&comparison).contains("\u{1b}["));
    }

    #[test]
    fn test_render_empty_calls() {
        assert_eq!(render_calls(&[]), "[]");
    }
}
