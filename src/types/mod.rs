//! Shared content model
//!
//! Connectors translate these types into vendor DTOs and back. Vendor DTOs
//! stay private to each connector module.

mod audio;
mod chat;
mod image;
mod metadata;
mod streaming;
mod tools;
mod translation;
mod usage;

pub use audio::*;
pub use chat::*;
pub use image::*;
pub use metadata::*;
pub use streaming::*;
pub use tools::*;
pub use translation::*;
pub use usage::*;
