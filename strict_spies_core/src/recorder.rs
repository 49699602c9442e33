//! # Recorder Module
//!
//! Manufactures spies and owns the call log they write to.
//!
//! Every spy produced by one [`Recorder`] appends to the same log, so the log
//! interleaves calls from all of them in the exact order they happened. That
//! shared ordering is what lets a test assert on cross-function call order.

use crate::value::Value;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::rc::Rc;

/// A mock implementation invoked by a spy after its call is recorded.
pub type MockFn = Rc<dyn Fn(&[Value]) -> Value>;

type CallLog = Rc<RefCell<Vec<CallRecord>>>;

/// A single recorded invocation.
///
/// Records are immutable once appended. Arguments are stored exactly as
/// passed, so reference values keep their identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    name: String,

    /// Receiver captured by a scoped spy, `None` for plain spies.
    #[serde(skip_serializing_if = "Option::is_none")]
    receiver: Option<Value>,

    args: Vec<Value>,
}

impl CallRecord {
    fn new(name: &str, receiver: Option<Value>, args: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            receiver,
            args,
        }
    }

    /// Name of the spy that was called.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The receiver, if the call came from a scoped spy.
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }

    /// The arguments, in call order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Returns true if this record was produced by a scoped spy.
    pub fn is_scoped(&self) -> bool {
        self.receiver.is_some()
    }

    /// Flattens the record into `[name, receiver?, ...args]`.
    ///
    /// This is the shape expected call sequences are written in.
    pub fn to_values(&self) -> Vec<Value> {
        let mut values = Vec::with_capacity(self.args.len() + 2);
        values.push(Value::Str(self.name.clone()));
        if let Some(receiver) = &self.receiver {
            values.push(receiver.clone());
        }
        values.extend(self.args.iter().cloned());
        values
    }
}

impl From<&CallRecord> for Value {
    fn from(record: &CallRecord) -> Self {
        Value::List(record.to_values())
    }
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Value::from(self), f)
    }
}

/// Records every call made to the spies it creates.
///
/// A `Recorder` handle is cheap to clone; clones share the same call log.
///
/// # Example
///
/// ```rust
/// use strict_spies_core::{args, calls, Recorder};
/// use strict_spies_core::value::Value;
///
/// let spies = Recorder::new();
/// let callback = spies.create("callback");
///
/// callback.call(args!["hello", "world"]);
///
/// let observed: Vec<Value> = spies.calls().iter().map(Value::from).collect();
/// assert_eq!(observed, calls![["callback", "hello", "world"]]);
/// ```
#[derive(Clone, Default)]
pub struct Recorder {
    log: CallLog,
}

impl Recorder {
    /// Creates a recorder with an empty call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a spy that records `[name, ...args]` and returns
    /// [`Value::Undefined`].
    ///
    /// Names are not checked for uniqueness. Two spies with the same name
    /// produce records that cannot be told apart by name.
    pub fn create(&self, name: impl Into<String>) -> Spy {
        Spy {
            name: name.into(),
            log: Rc::clone(&self.log),
            mock: None,
        }
    }

    /// Creates a spy that records its call and then delegates to `mock`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use strict_spies_core::{args, Recorder};
    /// use strict_spies_core::value::Value;
    ///
    /// let spies = Recorder::new();
    /// let multiply = spies.create_with("callback", |args| {
    ///     let product = args.iter().filter_map(Value::as_i64).product::<i64>();
    ///     Value::from(product)
    /// });
    ///
    /// assert_eq!(multiply.call(args![5, 6]), Value::from(30));
    /// assert_eq!(spies.call_count(), 1);
    /// ```
    pub fn create_with<F>(&self, name: impl Into<String>, mock: F) -> Spy
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        Spy {
            name: name.into(),
            log: Rc::clone(&self.log),
            mock: Some(Rc::new(mock)),
        }
    }

    /// Creates a spy that also records the receiver it was invoked on.
    pub fn create_scoped(&self, name: impl Into<String>) -> ScopedSpy {
        ScopedSpy {
            name: name.into(),
            log: Rc::clone(&self.log),
        }
    }

    /// Creates a group of spies named `prefix.method` for each method name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use strict_spies_core::{args, Recorder};
    ///
    /// let spies = Recorder::new();
    /// let store = spies.create_obj("Store", ["get", "set"]);
    ///
    /// store["set"].call(args!["key", 1]);
    /// assert_eq!(spies.calls()[0].name(), "Store.set");
    /// ```
    pub fn create_obj<I, S>(&self, prefix: &str, method_names: I) -> SpyObject
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let methods = method_names
            .into_iter()
            .map(|method| {
                let method = method.as_ref();
                (method.to_string(), self.create(format!("{prefix}.{method}")))
            })
            .collect();

        SpyObject {
            prefix: prefix.to_string(),
            methods,
        }
    }

    /// Clears the call log.
    ///
    /// Spies created before the reset stay valid and keep recording into the
    /// same, now empty, log.
    pub fn reset(&self) {
        let dropped = {
            let mut log = self.log.borrow_mut();
            let dropped = log.len();
            log.clear();
            dropped
        };
        tracing::debug!(dropped, "spy call log reset");
    }

    /// Returns a snapshot of every call since creation or the last reset.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.log.borrow().clone()
    }

    /// Returns the number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.log.borrow().len()
    }

    /// Returns true if any spy has been called.
    pub fn has_calls(&self) -> bool {
        !self.log.borrow().is_empty()
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("calls", &self.log.borrow().len())
            .finish()
    }
}

fn append(log: &CallLog, record: CallRecord) {
    tracing::trace!(
        spy = %record.name,
        args = record.args.len(),
        scoped = record.is_scoped(),
        "recorded spy call"
    );
    log.borrow_mut().push(record);
}

/// A recording function created by [`Recorder::create`] or
/// [`Recorder::create_with`].
#[derive(Clone)]
pub struct Spy {
    name: String,
    log: CallLog,
    mock: Option<MockFn>,
}

impl Spy {
    /// Name recorded for each call.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records the call, then runs the mock implementation if there is one.
    ///
    /// Returns the mock's result, or [`Value::Undefined`] without a mock.
    pub fn call(&self, args: Vec<Value>) -> Value {
        match &self.mock {
            Some(mock) => {
                append(&self.log, CallRecord::new(&self.name, None, args.clone()));
                mock(&args)
            }
            None => {
                append(&self.log, CallRecord::new(&self.name, None, args));
                Value::Undefined
            }
        }
    }

    /// Returns the spy as a plain closure, for APIs that take callbacks.
    pub fn as_fn(&self) -> impl Fn(Vec<Value>) -> Value {
        let spy = self.clone();
        move |args| spy.call(args)
    }
}

impl fmt::Debug for Spy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spy")
            .field("name", &self.name)
            .field("mocked", &self.mock.is_some())
            .finish()
    }
}

/// A recording function that captures the receiver it was invoked on.
///
/// The receiver is passed explicitly as the first parameter of
/// [`ScopedSpy::call`] and recorded between the name and the arguments.
#[derive(Clone)]
pub struct ScopedSpy {
    name: String,
    log: CallLog,
}

impl ScopedSpy {
    /// Name recorded for each call.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records `[name, receiver, ...args]`.
    pub fn call(&self, receiver: impl Into<Value>, args: Vec<Value>) {
        append(
            &self.log,
            CallRecord::new(&self.name, Some(receiver.into()), args),
        );
    }
}

impl fmt::Debug for ScopedSpy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSpy").field("name", &self.name).finish()
    }
}

/// A named group of spies, standing in for an object with several methods.
#[derive(Debug, Clone)]
pub struct SpyObject {
    prefix: String,
    methods: BTreeMap<String, Spy>,
}

impl SpyObject {
    /// Prefix shared by every method spy.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Looks up the spy for `method`.
    pub fn get(&self, method: &str) -> Option<&Spy> {
        self.methods.get(method)
    }

    /// Calls `method` if the group has it, returning its result.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Option<Value> {
        self.get(method).map(|spy| spy.call(args))
    }

    /// Method names, in sorted order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Number of method spies.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if the object has no methods.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl Index<&str> for SpyObject {
    type Output = Spy;

    /// Panics if the group has no such method.
    fn index(&self, method: &str) -> &Spy {
        match self.methods.get(method) {
            Some(spy) => spy,
            None => panic!("spy object '{}' has no method '{}'", self.prefix, method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    fn flattened(spies: &Recorder) -> Vec<Value> {
        spies.calls().iter().map(Value::from).collect()
    }

    #[test]
    fn test_unused_spy_records_nothing() {
        let spies = Recorder::new();
        spies.create("callback");

        assert!(spies.calls().is_empty());
        assert!(!spies.has_calls());
    }

    #[test]
    fn test_single_call_is_recorded_and_returns_undefined() {
        let spies = Recorder::new();
        let callback = spies.create("callback");

        let result = callback.call(args!["hello", "world"]);

        assert!(result.is_undefined());
        assert_eq!(flattened(&spies), crate::calls![["callback", "hello", "world"]]);
    }

    #[test]
    fn test_calls_interleave_across_spies() {
        let spies = Recorder::new();
        let spy1 = spies.create("callback1");
        let spy2 = spies.create("callback2");

        spy1.call(args![]);
        spy2.call(args![]);
        spy1.call(args![]);

        let names: Vec<_> = spies.calls().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, ["callback1", "callback2", "callback1"]);
    }

    #[test]
    fn test_for_each_style_callback() {
        let spies = Recorder::new();
        let callback = spies.create("callback").as_fn();
        let items = ["a", "b", "c"];

        for (i, item) in items.iter().enumerate() {
            callback(args![*item, i, items.to_vec()]);
        }

        assert_eq!(
            flattened(&spies),
            crate::calls![
                ["callback", "a", 0, vec!["a", "b", "c"]],
                ["callback", "b", 1, vec!["a", "b", "c"]],
                ["callback", "c", 2, vec!["a", "b", "c"]],
            ]
        );
    }

    #[test]
    fn test_mock_result_is_returned() {
        let spies = Recorder::new();
        let callback = spies.create_with("callback", |args| {
            let x = args[0].as_i64().unwrap_or_default();
            let y = args[1].as_i64().unwrap_or_default();
            Value::from(x * y)
        });

        assert_eq!(callback.call(args![5, 6]), Value::from(30));
        assert_eq!(flattened(&spies), crate::calls![["callback", 5, 6]]);
    }

    #[test]
    fn test_mock_may_call_other_spies() {
        let spies = Recorder::new();
        let inner = spies.create("inner");
        let outer = spies.create_with("outer", move |args| inner.call(args.to_vec()));

        outer.call(args![1]);

        assert_eq!(flattened(&spies), crate::calls![["outer", 1], ["inner", 1]]);
    }

    #[test]
    fn test_scoped_spy_records_receiver() {
        let spies = Recorder::new();
        let callback = spies.create_scoped("callback");
        let receiver = Value::shared(Value::object([("hello", "world")]));

        callback.call(receiver.clone(), args!["arg1", "arg2"]);

        let calls = spies.calls();
        assert!(calls[0].is_scoped());
        assert!(calls[0].receiver().is_some_and(|r| r.same_ref(&receiver)));
        assert_eq!(
            flattened(&spies),
            crate::calls![[
                "callback",
                Value::object([("hello", "world")]),
                "arg1",
                "arg2"
            ]]
        );
    }

    #[test]
    fn test_create_obj_prefixes_names() {
        let spies = Recorder::new();
        let obj = spies.create_obj("P", ["x", "y"]);

        obj["x"].call(args![]);
        obj.call("y", args![1]);

        assert_eq!(obj.len(), 2);
        assert_eq!(obj.get("x").map(Spy::name), Some("P.x"));
        assert!(obj.call("z", args![]).is_none());
        assert_eq!(flattened(&spies), crate::calls![["P.x"], ["P.y", 1]]);
    }

    #[test]
    fn test_argument_identity_is_preserved() {
        let spies = Recorder::new();
        let callback = spies.create("callback");
        let payload = Value::shared(Value::object([("id", 7)]));

        callback.call(vec![payload.clone()]);

        let calls = spies.calls();
        assert!(calls[0].args()[0].same_ref(&payload));
        assert!(!calls[0].args()[0].same_ref(&Value::shared(Value::object([("id", 7)]))));
    }

    #[test]
    fn test_reset_keeps_spies_connected() {
        let spies = Recorder::new();
        let callback = spies.create("callback");

        callback.call(args!["before"]);
        spies.reset();
        assert!(spies.calls().is_empty());

        callback.call(args!["after"]);
        assert_eq!(flattened(&spies), crate::calls![["callback", "after"]]);
    }

    #[test]
    fn test_duplicate_names_are_accepted() {
        let spies = Recorder::new();
        spies.create("same").call(args![1]);
        spies.create("same").call(args![2]);

        assert_eq!(flattened(&spies), crate::calls![["same", 1], ["same", 2]]);
    }
}
