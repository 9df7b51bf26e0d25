//! iFlytek SparkDesk chat connector over a signed WebSocket.

mod builder;
mod client;
mod transformers;

pub use builder::SparkDeskBuilder;
pub use client::SparkDeskClient;
