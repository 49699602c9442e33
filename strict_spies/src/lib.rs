//! # strict_spies
//!
//! Test spies that record every call into one shared, ordered log.
//!
//! All spies created by one [`Recorder`] write to the same log, and
//! assertions always compare the *whole* log. Asserting that one callback
//! was called also asserts that nothing else was.
//!
//! ## Quick Start
//!
//! ```rust
//! use strict_spies::prelude::*;
//!
//! let spies = Recorder::new();
//! let callback = spies.create("callback");
//!
//! callback.call(args!["hello", "world"]);
//!
//! expect(&spies).to().have().single_call("callback", args!["hello", "world"]);
//! ```
//!
//! ## Mock Implementations
//!
//! ```rust
//! use strict_spies::prelude::*;
//!
//! let spies = Recorder::new();
//! let multiply = spies.create_with("multiply", |args| {
//!     Value::from(args.iter().filter_map(Value::as_f64).product::<f64>())
//! });
//!
//! assert_eq!(multiply.call(args![5, 6]), Value::from(30));
//! expect(&spies).to().have().calls(calls![["multiply", 5, 6]]);
//! ```
//!
//! ## Scoped Spies and Spy Objects
//!
//! ```rust
//! use strict_spies::prelude::*;
//!
//! let spies = Recorder::new();
//! let handler = spies.create_scoped("handler");
//! let store = spies.create_obj("Store", ["get", "set"]);
//!
//! handler.call(Value::object([("id", 1)]), args!["click"]);
//! store["set"].call(args!["key", "value"]);
//!
//! expect(&spies).to().have().calls(calls![
//!     ["handler", Value::object([("id", 1)]), "click"],
//!     ["Store.set", "key", "value"],
//! ]);
//! ```
//!
//! ## Compare-Object Matchers
//!
//! ```rust
//! use strict_spies::prelude::*;
//! use strict_spies::matchers::{TO_HAVE_ANY_CALLS, TO_HAVE_CALLS};
//!
//! let registry = MatcherRegistry::with_defaults();
//! let spies = Recorder::new();
//! spies.create("unused");
//!
//! assert_eq!(registry.evaluate(TO_HAVE_ANY_CALLS, &spies, &[], true), Some(Ok(())));
//! assert_eq!(registry.evaluate(TO_HAVE_CALLS, &spies, &calls![], false), Some(Ok(())));
//! ```

// Re-export the value macros
pub use strict_spies_core::{args, calls};

// Re-export core modules
pub use strict_spies_core::assertion;
pub use strict_spies_core::compare;
pub use strict_spies_core::error;
pub use strict_spies_core::matchers;
pub use strict_spies_core::recorder;
pub use strict_spies_core::runtime;
pub use strict_spies_core::value;

pub use strict_spies_core::{
    CallRecord, Comparator, Recorder, ScopedSpy, Spy, SpyError, SpyObject, Value,
};

/// Prelude module for convenient imports.
///
/// ```rust
/// use strict_spies::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{args, calls};
    pub use crate::{CallRecord, Comparator, Recorder, ScopedSpy, Spy, SpyError, SpyObject, Value};

    pub use strict_spies_core::assertion::{expect, Assertion};
    pub use strict_spies_core::compare::{
        has_any_calls, matches_all, matches_single, CompareConfig, Comparison, Difference,
        DifferenceKind, ReportFormat,
    };
    pub use strict_spies_core::matchers::{Matcher, MatchResult, MatcherRegistry};
    pub use strict_spies_core::runtime::{
        create_spy, current_recorder, has_recorder, init_recorder, set_recorder, take_recorder,
        with_recorder, RecorderGuard,
    };
    pub use strict_spies_core::value::deep_equals;
}
