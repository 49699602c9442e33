//! Example: testing an event emitter with strict spies
//!
//! This example drives a small event emitter with spy listeners and then
//! checks the shared call log, including a deliberately failing check to
//! show the mismatch report.
//!
//! Run with:
//! ```bash
//! cargo run --example event_emitter -p strict_spies
//! ```

use std::collections::BTreeMap;

use strict_spies::compare::{CompareConfig, ReportFormat};
use strict_spies::prelude::*;

// ============================================================================
// Code Under Test
// ============================================================================

/// A minimal emitter that forwards payloads to registered listeners.
#[derive(Default)]
struct Emitter {
    listeners: BTreeMap<String, Vec<Spy>>,
    context: Option<ScopedSpy>,
}

impl Emitter {
    fn on(&mut self, event: &str, listener: Spy) {
        self.listeners.entry(event.to_string()).or_default().push(listener);
    }

    fn on_with_context(&mut self, listener: ScopedSpy) {
        self.context = Some(listener);
    }

    fn emit(&self, event: &str, payload: Value) {
        if let Some(listeners) = self.listeners.get(event) {
            for listener in listeners {
                listener.call(vec![payload.clone()]);
            }
        }
        if let Some(context) = &self.context {
            context.call(Value::object([("emitter", "demo")]), args![event]);
        }
    }
}

fn main() {
    let spies = Recorder::new();
    let mut emitter = Emitter::default();

    emitter.on("open", spies.create("onOpen"));
    emitter.on("close", spies.create("onClose"));
    emitter.on_with_context(spies.create_scoped("onAny"));

    let payload = Value::shared(Value::object([("path", "notes.txt")]));
    emitter.emit("open", payload.clone());
    emitter.emit("close", Value::Undefined);

    // ========================================================================
    // Inspect the log directly
    // ========================================================================

    println!("Recorded {} calls:", spies.call_count());
    for call in spies.calls() {
        println!("  {call}");
    }

    let calls = spies.calls();
    println!(
        "Payload identity preserved: {}",
        calls[0].args()[0].same_ref(&payload)
    );

    // ========================================================================
    // Strict assertions
    // ========================================================================

    expect(&spies).to().have().calls(calls![
        ["onOpen", Value::object([("path", "notes.txt")])],
        ["onAny", Value::object([("emitter", "demo")]), "open"],
        ["onClose", ()],
        ["onAny", Value::object([("emitter", "demo")]), "close"],
    ]);
    println!("Full call log matched.");

    // Asserting a single call fails, because the other listeners ran too.
    let open_args = args![Value::object([("path", "notes.txt")])];
    match expect(&spies).try_single_call("onOpen", open_args) {
        Ok(_) => println!("Unexpected: single call matched"),
        Err(err) => println!("\nSingle-call check failed as expected:\n{err}"),
    }

    // The same comparison rendered as JSON.
    let comparator = Comparator::with_config(CompareConfig {
        format: ReportFormat::Json,
        ..Default::default()
    });
    let comparison = comparator.compare(&spies.calls(), &calls![["onOpen"]]);
    println!("\nJSON report:\n{}", comparator.report(&comparison));

    spies.reset();
    expect(&spies).not().to().have().any_calls();
    println!("\nLog cleared.");
}
