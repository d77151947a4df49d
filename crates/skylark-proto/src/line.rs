//! Line-based codec for tokio.
//!
//! Decoding accumulates raw bytes and yields complete newline-terminated
//! lines, buffering any trailing partial line until more data arrives.
//! Invalid UTF-8 is decoded lossily rather than rejected, and no length
//! limit is imposed at this layer. Encoding appends the CRLF terminator.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Codec turning a byte stream into CRLF-stripped lines and back.
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Index of next byte to check for newline.
    next_index: usize,
}

impl LineCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            let data = String::from_utf8_lossy(&line);
            Ok(Some(
                data.trim_end_matches(['\r', '\n']).to_string(),
            ))
        } else {
            // No complete line yet - remember where we stopped.
            self.next_index = src.len();
            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :test\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_buffers_partial_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :te");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"st\r\nNOTICE");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PING :test".to_string())
        );
        // The next partial line stays buffered.
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"NOTICE");
    }

    #[test]
    fn decode_multiple_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("ONE\r\nTWO\nTHREE\r\n");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("ONE".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("TWO".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("THREE".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_invalid_utf8_is_lossy() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PING \xff\xfe\r\n"[..]);

        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.starts_with("PING "));
        assert!(line.contains('\u{FFFD}'));
    }

    #[test]
    fn encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("PONG test".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG test\r\n");
    }
}
