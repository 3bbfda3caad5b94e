//! Outbound notifications.
//!
//! The push transport itself lives outside this crate; [`Notifier`] is the
//! seam. [`LogNotifier`] is the implementation shipped with the binary.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::info;

use monitor::SignalLabel;

/// Delivery of one formatted message.
///
/// Errors must be recoverable: the replay loop logs them and moves on.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, message: &str) -> anyhow::Result<()>;
}

/// Writes every message to the log.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> anyhow::Result<()> {
        info!(target: "push", %message, "notification");
        Ok(())
    }
}

/// `[buy_point limit_touch] 600000: triggered by price 11 at 10:42:00`
pub fn format_push_message(
    labels: &[SignalLabel],
    instrument: &str,
    price: f64,
    at: NaiveDateTime,
) -> String {
    let labels: Vec<&str> = labels.iter().map(SignalLabel::as_str).collect();
    format!(
        "[{}] {}: triggered by price {} at {}",
        labels.join(" "),
        instrument,
        price,
        at.format("%H:%M:%S")
    )
}
