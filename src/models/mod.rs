//! Data models

pub mod detection;
pub mod notification;
pub mod backend;

pub use detection::*;
pub use notification::*;
pub use backend::*;
