use async_trait::async_trait;

use crate::utils::error::AppError;

pub mod message;
pub mod telegram;

pub use telegram::TelegramNotifier;

/// Delivers a formatted text message to a destination channel.
///
/// Returns `Ok(false)` when the channel itself reported a delivery failure;
/// `Err` is reserved for transport faults. Callers log failures and move
/// on; there is no retry at this layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, destination: &str, text: &str) -> Result<bool, AppError>;
}
