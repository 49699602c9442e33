//! # strict_spies_core
//!
//! Strict test spies: recording functions that log every call into one
//! shared, ordered call log, plus the comparison logic that checks that log.
//!
//! This crate provides the following modules:
//!
//! - [`value`] - The dynamically typed value model for recorded arguments
//! - [`recorder`] - Creates spies and owns the shared call log
//! - [`compare`] - Strict whole-log comparison and mismatch reports
//! - [`matchers`] - Compare-object assertion adapter and matcher registry
//! - [`assertion`] - Fluent, panicking assertion adapter
//! - [`runtime`] - Thread-local "current recorder" support
//! - [`error`] - Assertion errors
//!
//! ## Example
//!
//! ```rust
//! use strict_spies_core::{args, calls, Comparator, Recorder};
//!
//! let spies = Recorder::new();
//! let on_open = spies.create("onOpen");
//! let on_close = spies.create("onClose");
//!
//! on_open.call(args!["file.txt"]);
//! on_close.call(args![]);
//!
//! let comparison = Comparator::new().compare(
//!     &spies.calls(),
//!     &calls![["onOpen", "file.txt"], ["onClose"]],
//! );
//! assert!(comparison.pass);
//! ```

pub mod assertion;
pub mod compare;
pub mod error;
pub mod matchers;
pub mod recorder;
pub mod runtime;
pub mod value;

pub use compare::Comparator;
pub use error::SpyError;
pub use recorder::{CallRecord, Recorder, ScopedSpy, Spy, SpyObject};
pub use value::Value;
