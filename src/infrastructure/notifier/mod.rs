//! Notifier implementations

mod email;
mod log;

pub use email::{EmailConfig, EmailNotifier};
pub use log::LogNotifier;
