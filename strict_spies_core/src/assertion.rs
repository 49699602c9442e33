//! # Assertion Module
//!
//! Fluent assertion adapter.
//!
//! ```rust
//! use strict_spies_core::{args, calls, Recorder};
//! use strict_spies_core::assertion::expect;
//!
//! let spies = Recorder::new();
//! let callback = spies.create("callback");
//!
//! expect(&spies).not().to().have().any_calls();
//!
//! callback.call(args!["hello", "world"]);
//! expect(&spies)
//!     .to()
//!     .have()
//!     .any_calls()
//!     .calls(calls![["callback", "hello", "world"]]);
//! ```
//!
//! Failed checks panic with the same diagnostic the compare-object
//! matchers produce. The negation rules match [`crate::matchers`]: negating
//! `calls` or `single_call` panics with the unsupported-negation error if the
//! positive match succeeds.

use crate::compare::Comparator;
use crate::error::{Result, SpyError};
use crate::matchers::{
    MatchResult, TO_HAVE_ANY_CALLS, TO_HAVE_CALLS, TO_HAVE_SINGLE_CALL,
};
use crate::recorder::Recorder;
use crate::value::Value;

/// Starts a fluent assertion on `spies`.
pub fn expect(spies: &Recorder) -> Assertion<'_> {
    Assertion::new(spies)
}

/// A chainable assertion over a recorder's call log.
#[derive(Debug, Clone)]
pub struct Assertion<'a> {
    spies: &'a Recorder,
    negated: bool,
    comparator: Comparator,
}

impl<'a> Assertion<'a> {
    /// Starts a positive assertion with the default comparator.
    pub fn new(spies: &'a Recorder) -> Self {
        Self {
            spies,
            negated: false,
            comparator: Comparator::new(),
        }
    }

    /// Uses `comparator` for the strict checks.
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Language chain, no effect.
    pub fn to(self) -> Self {
        self
    }

    /// Language chain, no effect.
    pub fn have(self) -> Self {
        self
    }

    /// Negates the following checks.
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Asserts that at least one call happened, or none when negated.
    pub fn any_calls(self) -> Self {
        unwrap_or_panic(self.try_any_calls())
    }

    /// Asserts the whole log equals `expected`.
    pub fn calls(self, expected: Vec<Value>) -> Self {
        unwrap_or_panic(self.try_calls(expected))
    }

    /// Asserts the log holds exactly the call `[name, ...args]`.
    pub fn single_call(self, name: &str, args: Vec<Value>) -> Self {
        unwrap_or_panic(self.try_single_call(name, args))
    }

    /// Non-panicking form of [`Assertion::any_calls`].
    pub fn try_any_calls(self) -> Result<Self> {
        let result = MatchResult::any_calls(&self.spies.calls());
        self.settle(TO_HAVE_ANY_CALLS, result)
    }

    /// Non-panicking form of [`Assertion::calls`].
    pub fn try_calls(self, expected: Vec<Value>) -> Result<Self> {
        let comparison = self.comparator.compare(&self.spies.calls(), &expected);
        let result = MatchResult::strict(TO_HAVE_CALLS, &comparison, &self.comparator);
        self.settle(TO_HAVE_CALLS, result)
    }

    /// Non-panicking form of [`Assertion::single_call`].
    pub fn try_single_call(self, name: &str, args: Vec<Value>) -> Result<Self> {
        let comparison = self
            .comparator
            .compare_single(&self.spies.calls(), name, &args);
        let result = MatchResult::strict(TO_HAVE_SINGLE_CALL, &comparison, &self.comparator);
        self.settle(TO_HAVE_SINGLE_CALL, result)
    }

    fn settle(self, check: &'static str, result: MatchResult) -> Result<Self> {
        if result.pass != self.negated {
            return Ok(self);
        }

        tracing::debug!(check, negated = self.negated, "spy assertion failed");
        Err(SpyError::Mismatch(result.message()?))
    }
}

fn unwrap_or_panic<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
