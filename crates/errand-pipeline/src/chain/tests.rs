//! Unit tests for handler chains.

use rstest::{fixture, rstest};

use super::*;
use crate::handler::Next;

type Trace = Vec<String>;
type TraceChain = HandlerChain<Trace, i64, i64>;
type TraceHandler = Handler<Trace, i64, i64>;

fn forwarding(tag: &'static str) -> TraceHandler {
    Handler::new(move |trace: &mut Trace, value: i64, next: Next<'_, Trace, i64, i64>| {
        trace.push(format!("{tag}:in"));
        let result = next.run(trace, value);
        trace.push(format!("{tag}:out"));
        result
    })
}

fn short_circuit(tag: &'static str, result: i64) -> TraceHandler {
    Handler::new(move |trace: &mut Trace, _value: i64, _next: Next<'_, Trace, i64, i64>| {
        trace.push(format!("{tag}:stop"));
        result
    })
}

fn traced_default(trace: &mut Trace, value: i64) -> i64 {
    trace.push(String::from("default"));
    value
}

#[fixture]
fn chain() -> TraceChain {
    TraceChain::new()
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

#[rstest]
fn empty_chain_runs_default_directly(chain: TraceChain) {
    let mut trace = Trace::new();
    let result = chain.invoke(&mut trace, 7, traced_default);
    assert_eq!(result, 7);
    assert_eq!(trace, ["default"]);
}

#[rstest]
fn handlers_nest_in_insertion_order(mut chain: TraceChain) {
    chain.add(forwarding("a"));
    chain.add(forwarding("b"));

    let mut trace = Trace::new();
    chain.invoke(&mut trace, 1, traced_default);
    assert_eq!(trace, ["a:in", "b:in", "default", "b:out", "a:out"]);
}

#[rstest]
fn short_circuit_skips_later_handlers_and_default(mut chain: TraceChain) {
    chain.add(short_circuit("a", -1));
    chain.add(forwarding("b"));

    let mut trace = Trace::new();
    let result = chain.invoke(&mut trace, 1, traced_default);
    assert_eq!(result, -1);
    assert_eq!(trace, ["a:stop"]);
}

#[rstest]
fn handlers_may_transform_parameters_and_results(mut chain: TraceChain) {
    chain.add(Handler::new(
        |trace: &mut Trace, value: i64, next: Next<'_, Trace, i64, i64>| {
            next.run(trace, value + 10) * 2
        },
    ));

    let mut trace = Trace::new();
    assert_eq!(chain.invoke(&mut trace, 1, traced_default), 22);
}

#[rstest]
fn handlers_may_run_the_remainder_repeatedly(mut chain: TraceChain) {
    chain.add(Handler::new(
        |trace: &mut Trace, value: i64, next: Next<'_, Trace, i64, i64>| {
            let first = next.run(trace, value);
            let second = next.run(trace, value + 1);
            first + second
        },
    ));

    let mut trace = Trace::new();
    assert_eq!(chain.invoke(&mut trace, 1, traced_default), 3);
    assert_eq!(trace, ["default", "default"]);
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[rstest]
fn remove_drops_first_occurrence_only(mut chain: TraceChain) {
    let handler = forwarding("dup");
    chain.add(handler.clone());
    chain.add(handler.clone());
    assert_eq!(chain.len(), 2);

    assert!(chain.remove(&handler));
    assert_eq!(chain.len(), 1);
    assert!(chain.contains(&handler));

    let mut trace = Trace::new();
    chain.invoke(&mut trace, 0, traced_default);
    assert_eq!(trace, ["dup:in", "default", "dup:out"]);
}

#[rstest]
fn remove_unknown_handler_is_a_no_op(mut chain: TraceChain) {
    chain.add(forwarding("a"));
    assert!(!chain.remove(&forwarding("a")));
    assert_eq!(chain.len(), 1);
}

#[rstest]
fn clones_are_independent_snapshots(mut chain: TraceChain) {
    chain.add(forwarding("a"));
    let snapshot = chain.clone();
    chain.add(forwarding("b"));
    assert_eq!(snapshot.len(), 1);
    assert_eq!(chain.len(), 2);
}

#[test]
fn default_chain_is_empty() {
    let chain = TraceChain::default();
    assert!(chain.is_empty());
}
