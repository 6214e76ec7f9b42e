//! In-memory host runtime and helpers shared by dispatcher tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::record::FaultRecord;
use crate::render::FaultRenderer;
use crate::runtime::{ErrorHook, ExceptionHook, Runtime, RuntimeError};
use crate::severity::SeveritySet;
use crate::{Dispatcher, ErrorDisposition};

struct ErrorSlot {
    hook: ErrorHook,
    mask: SeveritySet,
    own: bool,
}

struct ExceptionSlot {
    hook: ExceptionHook,
    own: bool,
}

/// Host that keeps hook stacks in memory and records termination requests.
#[derive(Default)]
pub(crate) struct FakeRuntime {
    error_hooks: Vec<ErrorSlot>,
    exception_hooks: Vec<ExceptionSlot>,
    own_hook_calls: Arc<AtomicUsize>,
    pub(crate) shutdown_hooks: usize,
    fail_shutdown_hook: bool,
    pub(crate) suppressed: bool,
    pub(crate) last_fault: Option<FaultRecord>,
    pub(crate) discarded: usize,
    pub(crate) terminations: Vec<i32>,
}

impl FakeRuntime {
    /// Pushes a foreign error hook that was active before any dispatcher.
    pub(crate) fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.error_hooks.push(ErrorSlot {
            hook,
            mask: SeveritySet::all(),
            own: false,
        });
        self
    }

    /// Pushes a foreign exception hook that was active before any
    /// dispatcher.
    pub(crate) fn with_exception_hook(mut self, hook: ExceptionHook) -> Self {
        self.exception_hooks.push(ExceptionSlot { hook, own: false });
        self
    }

    /// Makes shutdown hook installation fail.
    pub(crate) fn with_failing_shutdown_hook(mut self) -> Self {
        self.fail_shutdown_hook = true;
        self
    }

    /// Number of installed error hooks, foreign ones included.
    pub(crate) fn error_hook_depth(&self) -> usize {
        self.error_hooks.len()
    }

    /// Number of installed exception hooks, foreign ones included.
    pub(crate) fn exception_hook_depth(&self) -> usize {
        self.exception_hooks.len()
    }

    /// How often a dispatcher's own hook was reached through a chained
    /// previous hook.
    pub(crate) fn own_hook_calls(&self) -> usize {
        self.own_hook_calls.load(Ordering::SeqCst)
    }

    fn own_hook(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.own_hook_calls)
    }
}

impl Runtime for FakeRuntime {
    fn install_error_hook(&mut self, mask: SeveritySet) -> Option<ErrorHook> {
        let previous = self.error_hooks.last().map(|slot| Arc::clone(&slot.hook));
        let calls = self.own_hook();
        self.error_hooks.push(ErrorSlot {
            hook: Arc::new(move |_: &FaultRecord| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }),
            mask,
            own: true,
        });
        previous
    }

    fn restore_error_hook(&mut self) {
        self.error_hooks.pop();
    }

    fn install_exception_hook(&mut self) -> Option<ExceptionHook> {
        let previous = self
            .exception_hooks
            .last()
            .map(|slot| Arc::clone(&slot.hook));
        let calls = self.own_hook();
        self.exception_hooks.push(ExceptionSlot {
            hook: Arc::new(move |_: &FaultRecord| {
                calls.fetch_add(1, Ordering::SeqCst);
            }),
            own: true,
        });
        previous
    }

    fn restore_exception_hook(&mut self) {
        self.exception_hooks.pop();
    }

    fn install_shutdown_hook(&mut self) -> Result<(), RuntimeError> {
        if self.fail_shutdown_hook {
            return Err(RuntimeError::ShutdownHook {
                message: String::from("atexit table full"),
            });
        }
        self.shutdown_hooks += 1;
        Ok(())
    }

    fn reporting_suppressed(&self) -> bool {
        self.suppressed
    }

    fn last_fault(&self) -> Option<FaultRecord> {
        self.last_fault.clone()
    }

    fn discard_output(&mut self) {
        self.discarded += 1;
    }

    fn terminate(&mut self, code: i32) {
        self.terminations.push(code);
    }
}

/// Where a simulated error signal ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The dispatcher's hook received the fault.
    Dispatcher(ErrorDisposition),
    /// A foreign hook received the fault.
    Foreign,
    /// No hook accepted the fault.
    Unhooked,
}

/// Delivers `record` the way a host runtime would: to the innermost error
/// hook, provided its mask accepts the severity.
pub(crate) fn deliver_error(
    dispatcher: &mut Dispatcher<FakeRuntime>,
    record: FaultRecord,
) -> Delivery {
    let top = dispatcher
        .runtime()
        .error_hooks
        .last()
        .filter(|slot| slot.mask.contains(record.severity()))
        .map(|slot| (slot.own, Arc::clone(&slot.hook)));
    match top {
        Some((true, _)) => Delivery::Dispatcher(dispatcher.handle_error_record(record)),
        Some((false, hook)) => {
            hook(&record);
            Delivery::Foreign
        }
        None => Delivery::Unhooked,
    }
}

/// Delivers an uncaught exception to the innermost exception hook.
///
/// Returns the dispatcher's result when its own hook is innermost.
pub(crate) fn deliver_exception(
    dispatcher: &mut Dispatcher<FakeRuntime>,
    record: FaultRecord,
) -> Option<crate::DispatchResult> {
    let top = dispatcher
        .runtime()
        .exception_hooks
        .last()
        .map(|slot| (slot.own, Arc::clone(&slot.hook)));
    match top {
        Some((true, _)) => Some(dispatcher.handle_exception(record)),
        Some((false, hook)) => {
            hook(&record);
            None
        }
        None => None,
    }
}

/// Error hook that counts its invocations.
pub(crate) fn counting_error_hook() -> (ErrorHook, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let hook: ErrorHook = Arc::new(move |_: &FaultRecord| {
        counter.fetch_add(1, Ordering::SeqCst);
        false
    });
    (hook, calls)
}

/// Exception hook that keeps every record it receives.
pub(crate) fn recording_exception_hook() -> (ExceptionHook, Arc<Mutex<Vec<FaultRecord>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let hook: ExceptionHook = Arc::new(move |record: &FaultRecord| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    });
    (hook, seen)
}

/// Renderer that keeps every record it renders.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    rendered: Mutex<Vec<FaultRecord>>,
}

impl RecordingRenderer {
    pub(crate) fn rendered(&self) -> Vec<FaultRecord> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FaultRenderer for RecordingRenderer {
    fn render_fault(&self, record: &FaultRecord) {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

/// Dispatcher over a default [`FakeRuntime`] with a recording renderer.
pub(crate) fn recording_dispatcher(
    runtime: FakeRuntime,
) -> (Dispatcher<FakeRuntime>, Arc<RecordingRenderer>) {
    let renderer = Arc::new(RecordingRenderer::default());
    let dispatcher = Dispatcher::with_renderer(runtime, renderer.clone());
    (dispatcher, renderer)
}

static SERIAL: Mutex<()> = Mutex::new(());

/// Serialises tests that touch process-wide hooks.
pub(crate) fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}
