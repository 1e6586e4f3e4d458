//! End-to-end tests for the capture protocol.
//!
//! A `MemoryTransport` handle plays the host while a `CaptureSession` owns the
//! other end. These tests cover:
//! - Framing: the length prefix matches the payload that follows
//! - Ordering and atomicity across back-to-back requests
//! - Silence for idle polls, unknown commands and malformed input
//! - Real JPEG frames from the built-in test pattern

use capture_serial::camera::{
    CameraError, Encoder, Frame, FrameSource, JpegEncoder, PixelFormat, Quality, SourceSettings,
    TestPatternSource,
};
use capture_serial::protocol::{read_response, Response};
use capture_serial::session::{CaptureSession, Iteration, SessionConfig, SessionState};
use capture_serial::transport::MemoryTransport;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// 2x2 grayscale frames, counting how many were requested.
#[derive(Default)]
struct CountingSource {
    captures: u32,
}

impl FrameSource for CountingSource {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        self.captures += 1;
        Ok(Frame {
            data: vec![self.captures as u8; 4],
            width: 2,
            height: 2,
            format: PixelFormat::Grayscale,
            timestamp: Instant::now(),
        })
    }
}

/// Emits `len` bytes tagged with the first pixel, so frames can be told apart.
struct TaggedEncoder {
    len: usize,
}

impl Encoder for TaggedEncoder {
    fn encode(&mut self, frame: &Frame, _quality: Quality) -> Result<Vec<u8>, CameraError> {
        Ok(vec![frame.data[0]; self.len])
    }
}

fn fast_config() -> SessionConfig {
    SessionConfig {
        idle_interval: Duration::from_millis(1),
        ..SessionConfig::default()
    }
}

fn mock_session(
    payload_len: usize,
) -> (
    MemoryTransport,
    CaptureSession<MemoryTransport, CountingSource, TaggedEncoder>,
) {
    let host = MemoryTransport::new();
    let session = CaptureSession::new(
        host.clone(),
        CountingSource::default(),
        TaggedEncoder { len: payload_len },
        fast_config(),
    );
    (host, session)
}

/// Split a byte stream into responses, asserting it ends cleanly.
fn read_all(wire: Vec<u8>) -> Vec<Response> {
    let total = wire.len() as u64;
    let mut cursor = Cursor::new(wire);
    let mut responses = Vec::new();
    while cursor.position() < total {
        responses.push(read_response(&mut cursor).expect("well-formed response"));
    }
    responses
}

#[test]
fn test_end_to_end_44_byte_payload() {
    let (host, mut session) = mock_session(44);
    host.push_input(b"CAPTURE\n");

    assert_eq!(session.poll_once().unwrap(), Iteration::Captured { bytes: 44 });

    let wire = host.take_output();
    assert_eq!(&wire[0..3], b"OK\n");
    assert_eq!(&wire[3..7], &[0x2C, 0x00, 0x00, 0x00]);
    assert_eq!(wire.len(), 3 + 4 + 44);

    let payload = &wire[7..];
    let responses = read_all(wire.clone());
    match &responses[..] {
        [Response::Ok(p)] => assert_eq!(p.as_bytes(), payload),
        other => panic!("Expected one Ok response, got {:?}", other),
    }
}

#[test]
fn test_length_prefix_matches_payload_for_many_sizes() {
    for len in [0usize, 1, 3, 255, 256, 65_536] {
        let (host, mut session) = mock_session(len);
        host.push_input(b"CAPTURE\n");
        session.poll_once().unwrap();

        let wire = host.take_output();
        let prefix = u32::from_le_bytes([wire[3], wire[4], wire[5], wire[6]]) as usize;
        assert_eq!(prefix, len);
        assert_eq!(wire.len() - 7, prefix);
    }
}

#[test]
fn test_idle_polls_produce_nothing() {
    let (host, mut session) = mock_session(44);
    for _ in 0..100 {
        assert_eq!(session.poll_once().unwrap(), Iteration::Idle);
        assert_eq!(session.state(), SessionState::Idle);
    }
    assert_eq!(host.output_len(), 0);
    assert_eq!(session.stats().captures, 0);
}

#[test]
fn test_command_exactness() {
    let (host, mut session) = mock_session(8);

    host.push_input(b"capture\n");
    assert_eq!(session.poll_once().unwrap(), Iteration::Ignored);
    assert_eq!(host.output_len(), 0);

    host.push_input(b"CAPTURE \n");
    assert_eq!(session.poll_once().unwrap(), Iteration::Captured { bytes: 8 });

    host.push_input(b"  CAPTURE\r\n");
    assert_eq!(session.poll_once().unwrap(), Iteration::Captured { bytes: 8 });

    assert_eq!(read_all(host.take_output()).len(), 2);
}

#[test]
fn test_ping_is_ignored() {
    let (host, mut session) = mock_session(8);
    host.push_input(b"PING\n");

    // One poll plus one idle interval's worth of further polls.
    for _ in 0..5 {
        session.poll_once().unwrap();
    }
    assert_eq!(host.output_len(), 0);
    assert_eq!(session.stats().ignored, 1);
}

#[test]
fn test_malformed_input_then_capture() {
    let (host, mut session) = mock_session(8);
    host.push_input(&[0xFF, 0xFE, 0xFD, b'\n']);
    host.push_input(b"CAPTURE\n");

    assert_eq!(session.poll_once().unwrap(), Iteration::Ignored);
    assert_eq!(host.output_len(), 0);
    assert_eq!(session.poll_once().unwrap(), Iteration::Captured { bytes: 8 });
    assert_eq!(session.stats().malformed, 1);
}

#[test]
fn test_back_to_back_requests_are_served_one_per_poll() {
    let (host, mut session) = mock_session(16);
    host.push_input(b"CAPTURE\nCAPTURE\n");

    assert!(matches!(session.poll_once().unwrap(), Iteration::Captured { .. }));
    let first = host.take_output();
    assert_eq!(first.len(), 7 + 16);

    assert!(matches!(session.poll_once().unwrap(), Iteration::Captured { .. }));
    let second = host.take_output();
    assert_eq!(second.len(), 7 + 16);

    assert_eq!(session.poll_once().unwrap(), Iteration::Idle);

    // Each payload comes from its own frame, never mixed.
    match (&read_all(first)[..], &read_all(second)[..]) {
        ([Response::Ok(a)], [Response::Ok(b)]) => {
            assert!(a.as_bytes().iter().all(|&x| x == 1));
            assert!(b.as_bytes().iter().all(|&x| x == 2));
        }
        other => panic!("Expected two Ok responses, got {:?}", other),
    }
}

#[test]
fn test_real_pattern_and_jpeg() {
    let host = MemoryTransport::new();
    let source = TestPatternSource::new(SourceSettings::default()).unwrap();
    let mut session = CaptureSession::new(host.clone(), source, JpegEncoder::new(), fast_config());

    host.push_input(b"CAPTURE\n");
    assert!(matches!(session.poll_once().unwrap(), Iteration::Captured { .. }));

    let responses = read_all(host.take_output());
    let payload = match &responses[..] {
        [Response::Ok(p)] => p.clone(),
        other => panic!("Expected one Ok response, got {:?}", other),
    };
    let image = image::load_from_memory(payload.as_bytes()).unwrap();
    assert_eq!((image.width(), image.height()), (320, 160));
}

#[test]
fn test_threaded_host_and_device() {
    let host = MemoryTransport::new();
    let stop = Arc::new(AtomicBool::new(false));

    let device_end = host.clone();
    let device_stop = Arc::clone(&stop);
    let device = thread::spawn(move || {
        let mut session = CaptureSession::new(
            device_end,
            CountingSource::default(),
            TaggedEncoder { len: 44 },
            fast_config(),
        );
        session
            .run_until(|| device_stop.load(Ordering::SeqCst))
            .unwrap();
        session.stats()
    });

    host.push_input(b"CAPTURE\n");
    host.push_input(b"CAPTURE\n");

    let expected = 2 * (7 + 44);
    let deadline = Instant::now() + Duration::from_secs(5);
    while host.output_len() < expected && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    stop.store(true, Ordering::SeqCst);
    let stats = device.join().unwrap();

    assert_eq!(stats.captures, 2);
    let responses = read_all(host.take_output());
    assert_eq!(responses.len(), 2);
    assert!(responses
        .iter()
        .all(|r| matches!(r, Response::Ok(p) if p.len() == 44)));
}
