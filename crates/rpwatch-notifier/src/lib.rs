//! Outbound notifications for the repost watcher.
//!
//! [`Notifier`] is the delivery seam; [`TelegramNotifier`] sends text and
//! screenshots through the Telegram Bot API and forwards generic events to an
//! optional webhook. [`deliver`] renders a [`NotificationEvent`] and never
//! fails: delivery problems are logged and reported as `false`.

pub mod error;
pub mod event;
pub mod notifier;
pub mod telegram;

mod retry;

pub use error::NotifierError;
pub use event::{deliver, truncate_chars, NotificationEvent};
pub use notifier::Notifier;
pub use telegram::TelegramNotifier;
