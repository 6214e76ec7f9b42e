//! Interceptable invocation pipeline.
//!
//! A pipeline lets any number of independently registered handlers wrap a
//! named operation without the operation's implementer knowing about them.
//! Handlers nest around a terminal default in the order they were added:
//! the first handler added runs first and receives a [`Next`] continuation
//! that runs everything registered after it and, finally, the default.
//!
//! Because handlers wrap rather than precede the default, a handler can
//! inspect or transform the parameters on the way in and the result on the
//! way out. A handler that never calls [`Next::run`] suppresses every later
//! handler and the default for that invocation.
//!
//! # Example
//!
//! ```
//! use errand_pipeline::{Handler, HandlerChain};
//!
//! type Log = Vec<&'static str>;
//!
//! let outer: Handler<Log, u32, u32> = Handler::new(|log: &mut Log, value: u32, next| {
//!     log.push("outer");
//!     next.run(log, value + 1) * 10
//! });
//! let mut chain = HandlerChain::new();
//! chain.add(outer);
//!
//! let mut log = Log::new();
//! let result = chain.invoke(&mut log, 1, |log: &mut Log, value: u32| {
//!     log.push("default");
//!     value
//! });
//! assert_eq!(result, 20);
//! assert_eq!(log, ["outer", "default"]);
//! ```

pub mod chain;
pub mod handler;
pub mod pipeline;

#[cfg(test)]
mod tests;

pub use self::chain::HandlerChain;
pub use self::handler::{Handler, Next};
pub use self::pipeline::Pipeline;
