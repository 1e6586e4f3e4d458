//! Length-prefixed response framing.
//!
//! Every response is a status line followed by a little-endian `u32` length
//! and exactly that many bytes:
//!
//! ```text
//! OK\n  | len: u32 LE | payload
//! ERR\n | len: u32 LE | reason (UTF-8)
//! ```

use std::io::{self, Read, Write};

use super::ProtocolError;

/// Status line preceding a successful capture.
pub const STATUS_OK: &[u8] = b"OK\n";

/// Status line preceding a failure report.
pub const STATUS_ERR: &[u8] = b"ERR\n";

/// Longest status line accepted by [`read_response`], newline included.
const MAX_STATUS_LEN: usize = 16;

/// Encoded image bytes whose length fits the wire's `u32` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    bytes: Vec<u8>,
    len: u32,
}

impl EncodedPayload {
    /// Wrap encoder output. Fails if the length cannot be expressed as `u32`.
    pub fn new(bytes: Vec<u8>) -> Result<Self, ProtocolError> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| ProtocolError::PayloadTooLarge(bytes.len()))?;
        Ok(Self { bytes, len })
    }

    /// Length as written in the prefix.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One framed reply to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A captured and encoded frame.
    Ok(EncodedPayload),
    /// A capture or encode failure, with a short reason.
    Err(String),
}

impl Response {
    /// Build a failure report. Reasons longer than `u32::MAX` are truncated
    /// on a character boundary.
    pub fn error(reason: impl Into<String>) -> Self {
        let mut reason = reason.into();
        if u32::try_from(reason.len()).is_err() {
            let mut cut = u32::MAX as usize;
            while !reason.is_char_boundary(cut) {
                cut -= 1;
            }
            reason.truncate(cut);
        }
        Response::Err(reason)
    }

    fn status(&self) -> &'static [u8] {
        match self {
            Response::Ok(_) => STATUS_OK,
            Response::Err(_) => STATUS_ERR,
        }
    }

    fn body(&self) -> &[u8] {
        match self {
            Response::Ok(payload) => payload.as_bytes(),
            Response::Err(reason) => reason.as_bytes(),
        }
    }

    /// Number of bytes [`Response::write_to`] puts on the wire.
    pub fn wire_len(&self) -> usize {
        self.status().len() + 4 + self.body().len()
    }

    /// Write status, length and body, in that order, then flush.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        let body = self.body();
        // Both constructors guarantee the body fits in u32.
        let len = body.len() as u32;
        writer.write_all(self.status())?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(body)?;
        writer.flush()
    }
}

/// Read one framed response from `reader`, blocking until it is complete.
pub fn read_response<R: Read + ?Sized>(reader: &mut R) -> Result<Response, ProtocolError> {
    let status = read_status_line(reader)?;

    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix)?;
    let len = u32::from_le_bytes(prefix);

    // The prefix is untrusted: grow the buffer as bytes arrive.
    let mut body = Vec::new();
    let read = Read::take(&mut *reader, u64::from(len)).read_to_end(&mut body)?;
    if read < len as usize {
        return Err(ProtocolError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("payload truncated: expected {} bytes, got {}", len, read),
        )));
    }

    match status.as_slice() {
        STATUS_OK => Ok(Response::Ok(EncodedPayload::new(body)?)),
        STATUS_ERR => {
            let reason = String::from_utf8_lossy(&body).into_owned();
            Ok(Response::Err(reason))
        }
        other => Err(ProtocolError::UnexpectedStatus(
            String::from_utf8_lossy(other).trim_end().to_string(),
        )),
    }
}

fn read_status_line<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut line = Vec::with_capacity(MAX_STATUS_LEN);
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        line.push(byte[0]);
        if byte[0] == b'\n' {
            return Ok(line);
        }
        if line.len() >= MAX_STATUS_LEN {
            return Err(ProtocolError::UnexpectedStatus(
                String::from_utf8_lossy(&line).into_owned(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ok_frame_layout() {
        let payload = EncodedPayload::new(vec![0xAB; 44]).unwrap();
        let mut wire = Vec::new();
        Response::Ok(payload).write_to(&mut wire).unwrap();

        assert_eq!(&wire[..3], b"OK\n");
        assert_eq!(&wire[3..7], &[0x2C, 0x00, 0x00, 0x00]);
        assert_eq!(wire.len(), 3 + 4 + 44);
        assert!(wire[7..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_err_frame_layout() {
        let mut wire = Vec::new();
        Response::error("sensor timeout").write_to(&mut wire).unwrap();

        assert_eq!(&wire[..4], b"ERR\n");
        assert_eq!(u32::from_le_bytes([wire[4], wire[5], wire[6], wire[7]]), 14);
        assert_eq!(&wire[8..], b"sensor timeout");
    }

    #[test]
    fn test_empty_payload_has_zero_prefix() {
        let payload = EncodedPayload::new(Vec::new()).unwrap();
        assert!(payload.is_empty());
        let response = Response::Ok(payload);
        let mut wire = Vec::new();
        response.write_to(&mut wire).unwrap();
        assert_eq!(wire, b"OK\n\0\0\0\0");
        assert_eq!(response.wire_len(), 7);
    }

    #[test]
    fn test_read_response_ok() {
        let mut wire = b"OK\n".to_vec();
        wire.extend_from_slice(&3u32.to_le_bytes());
        wire.extend_from_slice(&[1, 2, 3]);

        let response = read_response(&mut Cursor::new(wire)).unwrap();
        match response {
            Response::Ok(payload) => assert_eq!(payload.as_bytes(), &[1, 2, 3]),
            other => panic!("Expected Ok, got {:?}", other),
        }
    }

    #[test]
    fn test_read_response_err() {
        let mut wire = b"ERR\n".to_vec();
        wire.extend_from_slice(&4u32.to_le_bytes());
        wire.extend_from_slice(b"busy");

        let response = read_response(&mut Cursor::new(wire)).unwrap();
        assert_eq!(response, Response::Err("busy".to_string()));
    }

    #[test]
    fn test_read_response_truncated_payload() {
        let mut wire = b"OK\n".to_vec();
        wire.extend_from_slice(&10u32.to_le_bytes());
        wire.extend_from_slice(&[0; 4]);

        let err = read_response(&mut Cursor::new(wire)).unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
    }

    #[test]
    fn test_read_response_corrupt_prefix_does_not_preallocate() {
        let mut wire = b"OK\n".to_vec();
        wire.extend_from_slice(&u32::MAX.to_le_bytes());
        wire.extend_from_slice(b"short");

        let err = read_response(&mut Cursor::new(wire)).unwrap_err();
        match err {
            ProtocolError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("Expected Io, got {:?}", other),
        }
    }

    #[test]
    fn test_read_response_unknown_status() {
        let mut wire = b"NOPE\n".to_vec();
        wire.extend_from_slice(&0u32.to_le_bytes());

        let err = read_response(&mut Cursor::new(wire)).unwrap_err();
        match err {
            ProtocolError::UnexpectedStatus(status) => assert_eq!(status, "NOPE"),
            other => panic!("Expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_read_response_runaway_status_line() {
        let wire = vec![b'X'; 64];
        let err = read_response(&mut Cursor::new(wire)).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedStatus(_)));
    }

    #[test]
    fn test_consecutive_frames_read_back_in_order() {
        let mut wire = Vec::new();
        Response::Ok(EncodedPayload::new(vec![7; 5]).unwrap())
            .write_to(&mut wire)
            .unwrap();
        Response::error("x").write_to(&mut wire).unwrap();

        let mut cursor = Cursor::new(wire);
        assert!(matches!(read_response(&mut cursor).unwrap(), Response::Ok(p) if p.len() == 5));
        assert_eq!(read_response(&mut cursor).unwrap(), Response::Err("x".to_string()));
    }
}
