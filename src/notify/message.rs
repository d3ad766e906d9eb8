use crate::models::{Transition, TransitionEvent};

/// Timestamp format used in outbound messages.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders the outbound alert text for a transition event. Subscribers'
/// clients key off this wording, so the format is fixed.
pub fn render(event: &TransitionEvent) -> String {
    match event.transition {
        Transition::BecameAvailable => format!(
            "🎉 IN STOCK ALERT! 🎉\n\n{} is now available!\n\nYou can buy it here: {}\n\nChecked at: {}",
            event.product.name,
            event.product.url,
            event.at.format(TIMESTAMP_FORMAT),
        ),
        Transition::BecameUnavailable => format!(
            "⚠️ OUT OF STOCK ALERT ⚠️\n\n{} is no longer available.\n\nWe'll notify you when it's back in stock.",
            event.product.name,
        ),
    }
}
