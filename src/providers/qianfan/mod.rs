//! Baidu QianFan (ERNIE) chat connector.

mod builder;
mod client;
mod transformers;

pub use builder::QianFanBuilder;
pub use client::QianFanClient;
