//! Thread-local fault-reporting suppression.

use std::cell::Cell;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct Scope;

impl Scope {
    fn enter() -> Self {
        DEPTH.with(|depth| depth.set(depth.get().saturating_add(1)));
        Self
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Runs `body` with fault reporting suppressed on the current thread.
///
/// Scopes nest; reporting resumes when the outermost scope ends, even if
/// `body` panics.
#[must_use]
pub fn silence<T>(body: impl FnOnce() -> T) -> T {
    let _scope = Scope::enter();
    body()
}

/// Returns `true` inside a [`silence`] scope on the current thread.
#[must_use]
pub fn is_silenced() -> bool {
    DEPTH.with(Cell::get) > 0
}
