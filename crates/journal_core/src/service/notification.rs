//! Best-effort notification collaborator.

use log::info;

/// Outbound sink invoked after successful mutations.
///
/// Delivery is fire-and-forget: the trait is infallible by design, so a sink
/// implementation can never fail the mutation that triggered it.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default sink that routes notifications through the logging pipeline.
#[derive(Debug, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, message: &str) {
        info!("event=notification module=service status=ok message={message}");
    }
}
