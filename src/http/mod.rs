//! HTTP plumbing shared by the connectors.

mod client;
mod config;
mod response;

pub use client::build_http_client_from_config;
pub use config::{HttpConfig, HttpConfigBuilder};
pub use response::{body_stream, decode_json, post_json, post_stream, read_body};
pub(crate) use response::{post_form, post_raw, post_with_query};
