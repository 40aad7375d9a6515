//! Progress and result reporting.

use gridplace_model::PluginEvent;

/// Outbound channel to the presentation layer.
///
/// Delivery is fire-and-forget: a sink that cannot deliver drops the event.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Never blocks on the receiver.
    fn emit(&self, event: PluginEvent);
}
