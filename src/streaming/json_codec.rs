//! Incremental decoder for concatenated JSON documents.

use bytes::{Buf, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio_util::codec::{Decoder, FramedRead};
use tokio_util::io::StreamReader;

use super::JsonValueStream;
use crate::error::LlmError;

/// Splits a byte stream into complete top-level JSON objects.
///
/// Bytes between objects are separators and are dropped: whitespace, `,`,
/// the brackets of an enclosing array, SSE `data:` prefixes and `[DONE]`
/// markers. Braces inside string literals (including escaped quotes) do not
/// count towards nesting. Structural characters are ASCII, so a chunk
/// boundary inside a multi-byte UTF-8 sequence never confuses the scanner.
#[derive(Debug, Default)]
pub struct JsonDocumentCodec {
    /// Bytes of the current document already scanned.
    scanned: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl JsonDocumentCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Decoder for JsonDocumentCodec {
    type Item = serde_json::Value;
    type Error = LlmError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while self.scanned < src.len() {
            let byte = src[self.scanned];
            self.scanned += 1;

            if self.depth == 0 {
                if byte == b'{' {
                    src.advance(self.scanned - 1);
                    self.scanned = 1;
                    self.depth = 1;
                }
                continue;
            }

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        let document = src.split_to(self.scanned);
                        self.reset();
                        return serde_json::from_slice(&document).map(Some).map_err(|e| {
                            LlmError::ParseError(format!("Invalid JSON document in stream: {e}"))
                        });
                    }
                }
                _ => {}
            }
        }

        if self.depth == 0 {
            src.clear();
            self.scanned = 0;
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(document) = self.decode(src)? {
            return Ok(Some(document));
        }
        if !src.is_empty() {
            tracing::debug!(bytes = src.len(), "discarding incomplete trailing JSON fragment");
            src.clear();
        }
        self.reset();
        Ok(None)
    }
}

/// Decode a chunked HTTP body into JSON documents.
pub fn json_document_stream<S, E>(byte_stream: S) -> JsonValueStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display,
{
    let reader = StreamReader::new(
        byte_stream.map(|chunk| chunk.map_err(|e| std::io::Error::other(e.to_string()))),
    );
    Box::pin(FramedRead::new(reader, JsonDocumentCodec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn decode_chunks(chunks: &[&[u8]]) -> Vec<Value> {
        let mut codec = JsonDocumentCodec::new();
        let mut buf = BytesMut::new();
        let mut out = Vec::new();
        for chunk in chunks {
            buf.extend_from_slice(chunk);
            while let Some(v) = codec.decode(&mut buf).unwrap() {
                out.push(v);
            }
        }
        while let Some(v) = codec.decode_eof(&mut buf).unwrap() {
            out.push(v);
        }
        out
    }

    #[test]
    fn splits_json_array_into_objects() {
        let out = decode_chunks(&[br#"[{"a":1},
{"b":[1,2,{"c":3}]}]"#]);
        assert_eq!(out, vec![json!({"a":1}), json!({"b":[1,2,{"c":3}]})]);
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let out = decode_chunks(&[br#"{"t":"}{ \"quoted\" \\"}{"u":"]"}"#]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["t"], r#"}{ "quoted" \"#);
        assert_eq!(out[1]["u"], "]");
    }

    #[test]
    fn skips_sse_prefixes_and_done_marker() {
        let out = decode_chunks(&[b"data: {\"x\":1}\n\ndata: [DONE]\n\n"]);
        assert_eq!(out, vec![json!({"x":1})]);
    }

    #[test]
    fn incomplete_tail_is_discarded() {
        let out = decode_chunks(&[br#"[{"a":1},{"b":"unterminated"#]);
        assert_eq!(out, vec![json!({"a":1})]);
    }

    #[test]
    fn split_inside_multibyte_character() {
        let doc = r#"{"text":"你好"}"#.as_bytes();
        let mid = doc.iter().position(|b| *b >= 0x80).unwrap() + 1;
        let out = decode_chunks(&[&doc[..mid], &doc[mid..]]);
        assert_eq!(out[0]["text"], "你好");
    }

    #[test]
    fn invalid_document_is_a_parse_error() {
        let mut codec = JsonDocumentCodec::new();
        let mut buf = BytesMut::from(&b"{\"a\" 1}"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(LlmError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn stream_adapter_yields_documents_in_order() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"[{\"n\":")),
            Ok(Bytes::from_static(b"1},{\"n\":2}")),
            Ok(Bytes::from_static(b",{\"n\":3}]")),
        ];
        let values: Vec<Value> = json_document_stream(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        let ns: Vec<i64> = values.iter().map(|v| v["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn any_chunking_yields_every_document(
            texts in prop::collection::vec("[a-z{}\\[\\]\"\\\\ 你]{0,12}", 1..6),
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
        ) {
            let docs: Vec<Value> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| json!({"i": i, "text": t, "nested": {"k": [t]}}))
                .collect();
            let body = serde_json::to_vec(&docs).unwrap();

            let mut points: Vec<usize> = cuts.iter().map(|c| c.index(body.len())).collect();
            points.sort_unstable();
            points.dedup();
            let mut chunks = Vec::new();
            let mut start = 0;
            for p in points {
                chunks.push(&body[start..p]);
                start = p;
            }
            chunks.push(&body[start..]);

            prop_assert_eq!(decode_chunks(&chunks), docs);
        }
    }
}
