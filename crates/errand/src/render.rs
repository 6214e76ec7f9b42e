//! Fault rendering capability used by the exception default path.

use std::sync::Arc;

/// Presents a fault to whoever operates the process.
pub trait FaultRenderer: Send + Sync {
    /// Renders `record`.
    fn render_fault(&self, record: &crate::FaultRecord);
}

impl<T: FaultRenderer + ?Sized> FaultRenderer for Arc<T> {
    fn render_fault(&self, record: &crate::FaultRecord) {
        (**self).render_fault(record);
    }
}

/// Renderer that emits each fault as a structured `tracing` error event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRenderer;

impl FaultRenderer for TracingRenderer {
    fn render_fault(&self, record: &crate::FaultRecord) {
        let location = record.location().map(ToString::to_string);
        tracing::error!(
            target: "errand::fault",
            event = "fault",
            severity = %record.severity(),
            location = location.as_deref().unwrap_or("unknown"),
            exit_hint = record.exit_hint(),
            "{}",
            record.message()
        );
    }
}
