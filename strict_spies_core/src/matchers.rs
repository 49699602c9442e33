//! # Matchers Module
//!
//! Compare-object assertion adapter.
//!
//! Each [`Matcher`] inspects a [`Recorder`] and returns a [`MatchResult`], a
//! pass flag plus a lazily produced failure message. The host side,
//! [`expect`], decides whether the outcome is a failure, taking negation into
//! account. Matchers are collected in a [`MatcherRegistry`] keyed by name.
//!
//! The strict matchers ([`ToHaveCalls`], [`ToHaveSingleCall`]) cannot be
//! negated. When one of them matches, its result carries no message, and
//! asking for one yields [`SpyError::UnsupportedNegation`].

use crate::compare::{Comparator, Comparison};
use crate::error::SpyError;
use crate::recorder::{CallRecord, Recorder};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the whole-log matcher.
pub const TO_HAVE_CALLS: &str = "to_have_calls";

/// Name of the single-call matcher.
pub const TO_HAVE_SINGLE_CALL: &str = "to_have_single_call";

/// Name of the any-calls matcher.
pub const TO_HAVE_ANY_CALLS: &str = "to_have_any_calls";

#[derive(Debug, Clone)]
enum Message {
    Text(String),
    NegationUnsupported { matcher: &'static str },
}

/// The result of running a matcher.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Whether the positive form of the assertion holds.
    pub pass: bool,
    message: Message,
}

impl MatchResult {
    /// Result of a strict comparison made by `matcher`.
    pub fn strict(
        matcher: &'static str,
        comparison: &Comparison,
        comparator: &Comparator,
    ) -> Self {
        let message = if comparison.pass {
            Message::NegationUnsupported { matcher }
        } else {
            Message::Text(comparator.report(comparison))
        };

        Self {
            pass: comparison.pass,
            message,
        }
    }

    /// Result of checking whether any calls happened.
    ///
    /// The message always describes the failure of whichever form, positive
    /// or negated, the outcome contradicts.
    pub fn any_calls(observed: &[CallRecord]) -> Self {
        if observed.is_empty() {
            Self {
                pass: false,
                message: Message::Text("Expected at least some calls, but found none".to_string()),
            }
        } else {
            let calls: Vec<Value> = observed.iter().map(Value::from).collect();
            Self {
                pass: true,
                message: Message::Text(format!(
                    "Expected no calls, but found\n{}",
                    crate::compare::render_calls(&calls)
                )),
            }
        }
    }

    /// The failure message.
    ///
    /// Fails with [`SpyError::UnsupportedNegation`] for a strict matcher that
    /// passed, since only a negated assertion would need that message.
    pub fn message(&self) -> Result<String, SpyError> {
        match &self.message {
            Message::Text(text) => Ok(text.clone()),
            Message::NegationUnsupported { matcher } => {
                Err(SpyError::UnsupportedNegation { matcher: *matcher })
            }
        }
    }
}

/// A named assertion over a recorder's call log.
pub trait Matcher {
    /// Name the matcher is registered under.
    fn name(&self) -> &'static str;

    /// Runs the positive form of the assertion.
    fn compare(&self, spies: &Recorder, expected: &[Value]) -> MatchResult;
}

/// Asserts the whole log equals the expected records.
///
/// `expected` holds one list per call: `[name, receiver?, ...args]`.
#[derive(Debug, Clone, Default)]
pub struct ToHaveCalls {
    comparator: Comparator,
}

impl ToHaveCalls {
    /// Uses the default comparator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `comparator` for the strict comparison.
    pub fn with_comparator(comparator: Comparator) -> Self {
        Self { comparator }
    }
}

impl Matcher for ToHaveCalls {
    fn name(&self) -> &'static str {
        TO_HAVE_CALLS
    }

    fn compare(&self, spies: &Recorder, expected: &[Value]) -> MatchResult {
        let comparison = self.comparator.compare(&spies.calls(), expected);
        MatchResult::strict(TO_HAVE_CALLS, &comparison, &self.comparator)
    }
}

/// Asserts the log holds exactly one call.
///
/// `expected` is that call's `[name, ...args]`. Calls to any other spy of
/// the same recorder make it fail.
#[derive(Debug, Clone, Default)]
pub struct ToHaveSingleCall {
    comparator: Comparator,
}

impl ToHaveSingleCall {
    /// Uses the default comparator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `comparator` for the strict comparison.
    pub fn with_comparator(comparator: Comparator) -> Self {
        Self { comparator }
    }
}

impl Matcher for ToHaveSingleCall {
    fn name(&self) -> &'static str {
        TO_HAVE_SINGLE_CALL
    }

    fn compare(&self, spies: &Recorder, expected: &[Value]) -> MatchResult {
        let comparison = self
            .comparator
            .compare(&spies.calls(), &[Value::List(expected.to_vec())]);
        MatchResult::strict(TO_HAVE_SINGLE_CALL, &comparison, &self.comparator)
    }
}

/// Asserts that at least one call happened. Mostly used negated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToHaveAnyCalls;

impl Matcher for ToHaveAnyCalls {
    fn name(&self) -> &'static str {
        TO_HAVE_ANY_CALLS
    }

    fn compare(&self, spies: &Recorder, _expected: &[Value]) -> MatchResult {
        MatchResult::any_calls(&spies.calls())
    }
}

/// Evaluates `matcher` the way an assertion host does.
///
/// The assertion holds when the match outcome agrees with `negated`.
/// Otherwise the matcher's message becomes a [`SpyError::Mismatch`], unless
/// the matcher refuses to produce one.
///
/// # Example
///
/// ```rust
/// use strict_spies_core::{args, Recorder};
/// use strict_spies_core::error::SpyError;
/// use strict_spies_core::matchers::{expect, ToHaveAnyCalls, ToHaveSingleCall};
///
/// let spies = Recorder::new();
/// spies.create("cb");
/// assert!(expect(&ToHaveAnyCalls, &spies, &[], true).is_ok());
///
/// spies.create("cb").call(args!["x"]);
/// let negated = expect(&ToHaveSingleCall::new(), &spies, &args!["cb", "x"], true);
/// assert!(matches!(negated, Err(SpyError::UnsupportedNegation { .. })));
/// ```
pub fn expect(
    matcher: &dyn Matcher,
    spies: &Recorder,
    expected: &[Value],
    negated: bool,
) -> Result<(), SpyError> {
    let result = matcher.compare(spies, expected);
    if result.pass != negated {
        Ok(())
    } else {
        Err(SpyError::Mismatch(result.message()?))
    }
}

/// Matchers available to a test suite, keyed by name.
///
/// Registration is idempotent: registering a name twice keeps the first
/// matcher, so suite setup can run more than once.
#[derive(Default)]
pub struct MatcherRegistry {
    matchers: BTreeMap<&'static str, Box<dyn Matcher>>,
}

impl MatcherRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in matchers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Registers `matcher` under its name.
    ///
    /// Returns false, leaving the registry unchanged, if the name is taken.
    pub fn register<M>(&mut self, matcher: M) -> bool
    where
        M: Matcher + 'static,
    {
        let name = matcher.name();
        if self.matchers.contains_key(name) {
            tracing::debug!(matcher = name, "matcher already registered");
            return false;
        }

        tracing::debug!(matcher = name, "registered matcher");
        self.matchers.insert(name, Box::new(matcher));
        true
    }

    /// Registers the built-in matchers.
    pub fn register_defaults(&mut self) {
        self.register(ToHaveCalls::new());
        self.register(ToHaveSingleCall::new());
        self.register(ToHaveAnyCalls);
    }

    /// Looks up a matcher by name.
    pub fn get(&self, name: &str) -> Option<&dyn Matcher> {
        self.matchers.get(name).map(|matcher| matcher.as_ref())
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.matchers.contains_key(name)
    }

    /// Registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.matchers.keys().copied()
    }

    /// Number of registered matchers.
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Runs the matcher registered as `name`, or returns `None` if there is
    /// no such matcher.
    pub fn evaluate(
        &self,
        name: &str,
        spies: &Recorder,
        expected: &[Value],
        negated: bool,
    ) -> Option<Result<(), SpyError>> {
        self.get(name)
            .map(|matcher| expect(matcher, spies, expected, negated))
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("matchers", &self.matchers.keys().collect::<Vec<_>>())
            .finish()
    }
}
