//! Behaviour-driven tests for handler composition.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::{Handler, HandlerChain, Next};

type Trace = Vec<String>;

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestWorld {
    chain: HandlerChain<Trace, u32, u32>,
    registered: Vec<(String, Handler<Trace, u32, u32>)>,
    trace: Trace,
    result: Option<u32>,
}

impl TestWorld {
    fn handler_named(&self, name: &str) -> Handler<Trace, u32, u32> {
        self.registered
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, handler)| handler.clone())
            .unwrap_or_else(|| panic!("no handler named '{name}' was registered"))
    }
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

fn register(world: &mut TestWorld, name: &str, handler: Handler<Trace, u32, u32>) {
    world.chain.add(handler.clone());
    world.registered.push((name.to_owned(), handler));
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a forwarding handler {name}")]
fn given_forwarding(world: &mut TestWorld, name: String) {
    let tag = name.trim_matches('"').to_owned();
    let label = tag.clone();
    let handler = Handler::new(
        move |trace: &mut Trace, value: u32, next: Next<'_, Trace, u32, u32>| {
            trace.push(label.clone());
            next.run(trace, value)
        },
    );
    register(world, &tag, handler);
}

#[given("a suppressing handler {name}")]
fn given_suppressing(world: &mut TestWorld, name: String) {
    let tag = name.trim_matches('"').to_owned();
    let label = tag.clone();
    let handler = Handler::new(
        move |trace: &mut Trace, _value: u32, _next: Next<'_, Trace, u32, u32>| {
            trace.push(label.clone());
            0
        },
    );
    register(world, &tag, handler);
}

#[given("a doubling handler {name}")]
fn given_doubling(world: &mut TestWorld, name: String) {
    let tag = name.trim_matches('"').to_owned();
    let label = tag.clone();
    let handler = Handler::new(
        move |trace: &mut Trace, value: u32, next: Next<'_, Trace, u32, u32>| {
            trace.push(label.clone());
            next.run(trace, value) * 2
        },
    );
    register(world, &tag, handler);
}

#[given("handler {name} is removed")]
fn given_removed(world: &mut TestWorld, name: String) {
    let handler = world.handler_named(name.trim_matches('"'));
    assert!(world.chain.remove(&handler), "handler should be registered");
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the chain is invoked with {value}")]
fn when_invoked(world: &mut TestWorld, value: u32) {
    let mut trace = Trace::new();
    let result = world
        .chain
        .invoke(&mut trace, value, |trace: &mut Trace, input: u32| {
            trace.push(String::from("default"));
            input
        });
    world.trace = trace;
    world.result = Some(result);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the execution order is {order}")]
fn then_order(world: &mut TestWorld, order: String) {
    let expected: Vec<&str> = order
        .trim_matches('"')
        .split(',')
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .collect();
    assert_eq!(world.trace, expected);
}

#[then("the result is {value}")]
fn then_result(world: &mut TestWorld, value: u32) {
    assert_eq!(world.result, Some(value));
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/handler_composition.feature",
    name = "Handlers wrap the default in insertion order"
)]
fn handlers_wrap_default(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/handler_composition.feature",
    name = "A handler that does not forward suppresses the rest of the chain"
)]
fn non_forwarding_handler_suppresses_chain(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/handler_composition.feature",
    name = "Removed handlers no longer run"
)]
fn removed_handlers_do_not_run(world: TestWorld) {
    let _ = world;
}
