//! Test fixture utilities: load recorded vendor streams and re-chunk them

use bytes::Bytes;
use kernel_connectors::error::LlmError;
use kernel_connectors::types::ChatStreamEvent;
use std::io;

/// Read a fixture file relative to the crate root.
pub fn load_fixture(path: &str) -> String {
    let full = format!("{}/{path}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&full)
        .unwrap_or_else(|e| panic!("fixture {full}: {e}"))
        .replace("\r\n", "\n")
}

/// Split `data` into chunks whose sizes cycle through `sizes`, ignoring UTF-8
/// and token boundaries.
pub fn rechunk(data: &[u8], sizes: &[usize]) -> Vec<Result<Bytes, io::Error>> {
    let mut out = Vec::new();
    let mut offset = 0;
    let mut i = 0;
    while offset < data.len() {
        let size = sizes[i % sizes.len()].max(1);
        let end = (offset + size).min(data.len());
        out.push(Ok(Bytes::copy_from_slice(&data[offset..end])));
        offset = end;
        i += 1;
    }
    out
}

/// Concatenated content deltas of the successful events.
pub fn content_of(events: &[Result<ChatStreamEvent, LlmError>]) -> String {
    events
        .iter()
        .filter_map(|e| e.as_ref().ok().and_then(ChatStreamEvent::as_content_delta))
        .collect()
}
