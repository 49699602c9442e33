//! # Runtime Module
//!
//! Thread-local storage for a "current" [`Recorder`].
//!
//! Code under test sometimes builds its collaborators deep inside a call
//! chain where passing a recorder in is awkward. Installing a recorder for
//! the current thread lets that code create spies through [`create_spy`]
//! while the test keeps a handle on the same log.
//!
//! ## Usage
//!
//! ```rust
//! use strict_spies_core::args;
//! use strict_spies_core::runtime::{create_spy, RecorderGuard};
//!
//! let guard = RecorderGuard::new();
//!
//! if let Some(spy) = create_spy("handler") {
//!     spy.call(args!["event"]);
//! }
//!
//! assert_eq!(guard.recorder().call_count(), 1);
//! ```
//!
//! Each thread has its own slot, matching the rule that one test owns one
//! recorder.

use crate::recorder::{Recorder, Spy};
use std::cell::RefCell;

thread_local! {
    static RECORDER: RefCell<Option<Recorder>> = const { RefCell::new(None) };
}

/// Installs a fresh recorder for the current thread and returns a handle
/// to it.
///
/// Any previously installed recorder is replaced.
pub fn init_recorder() -> Recorder {
    let recorder = Recorder::new();
    set_recorder(recorder.clone());
    recorder
}

/// Installs `recorder` for the current thread.
pub fn set_recorder(recorder: Recorder) {
    RECORDER.with(|r| {
        *r.borrow_mut() = Some(recorder);
    });
}

/// Removes the current thread's recorder and returns it.
pub fn take_recorder() -> Option<Recorder> {
    RECORDER.with(|r| r.borrow_mut().take())
}

/// Checks if a recorder is installed for this thread.
///
/// # Example
///
/// ```rust
/// use strict_spies_core::runtime::{has_recorder, init_recorder, take_recorder};
///
/// assert!(!has_recorder());
/// init_recorder();
/// assert!(has_recorder());
/// take_recorder();
/// ```
pub fn has_recorder() -> bool {
    RECORDER.with(|r| r.borrow().is_some())
}

/// Returns a handle to the current thread's recorder.
pub fn current_recorder() -> Option<Recorder> {
    RECORDER.with(|r| r.borrow().clone())
}

/// Runs `f` with the current thread's recorder, if there is one.
pub fn with_recorder<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&Recorder) -> R,
{
    current_recorder().map(|recorder| f(&recorder))
}

/// Creates a spy on the current thread's recorder.
///
/// Returns `None` if no recorder is installed.
pub fn create_spy(name: impl Into<String>) -> Option<Spy> {
    with_recorder(|recorder| recorder.create(name))
}

/// RAII guard that installs a fresh recorder for its scope.
///
/// Whatever recorder was installed before is restored when the guard drops.
pub struct RecorderGuard {
    recorder: Recorder,
    previous: Option<Recorder>,
}

impl RecorderGuard {
    /// Installs a fresh recorder, saving the current one.
    pub fn new() -> Self {
        let previous = take_recorder();
        let recorder = init_recorder();
        Self { recorder, previous }
    }

    /// The recorder installed by this guard.
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }
}

impl Default for RecorderGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecorderGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => set_recorder(previous),
            None => {
                take_recorder();
            }
        }
    }
}
