//! Domain definitions.

pub mod media;
pub mod message;
pub mod property;
pub mod user;

pub use self::{message::Message, property::Property};
