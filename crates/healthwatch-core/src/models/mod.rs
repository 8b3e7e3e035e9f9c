//! Data models for healthwatch

mod event;
mod notification;

pub use event::*;
pub use notification::*;
