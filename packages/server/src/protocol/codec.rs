//! Length-prefixed JSON framing over a TCP stream.
//!
//! A raw byte stream does not preserve message boundaries: one read may carry
//! half a message or several at once. Every frame is therefore sent as a u32
//! big-endian length prefix followed by that many bytes of JSON, and the
//! decoder buffers until a whole frame is available.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use super::frame::Frame;

/// Upper bound on the JSON payload of a single frame, in bytes.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Length of the frame header (u32 big-endian payload length).
const HEADER_LEN: usize = 4;

/// Errors produced while encoding or decoding frames
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying transport error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Declared payload length exceeds [`MAX_FRAME_LEN`]
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    FrameTooLarge(usize),

    /// Payload is not valid JSON or lacks a required field
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
}

/// Codec turning a byte stream into [`Frame`]s and back
#[derive(Debug, Default)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, CodecError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&src[..HEADER_LEN]);
        let payload_len = u32::from_be_bytes(header) as usize;

        if payload_len > MAX_FRAME_LEN {
            return Err(CodecError::FrameTooLarge(payload_len));
        }

        if src.len() < HEADER_LEN + payload_len {
            // Not enough buffered yet; reserve for the rest of this frame.
            src.reserve(HEADER_LEN + payload_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(payload_len);
        let frame = serde_json::from_slice(&payload)?;
        Ok(Some(frame))
    }
}

impl Encoder<&Frame> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<(), CodecError> {
        let payload = serde_json::to_vec(frame)?;
        if payload.len() > MAX_FRAME_LEN {
            return Err(CodecError::FrameTooLarge(payload.len()));
        }

        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}
