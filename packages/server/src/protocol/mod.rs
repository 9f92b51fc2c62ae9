//! Wire protocol for the Tsudoi chat application.
//!
//! Frames are organized in two layers:
//! - `frame`: the logical message vocabulary exchanged between peers
//! - `codec`: length-prefixed framing of those messages over a TCP stream

pub mod codec;
pub mod frame;

pub use codec::{CodecError, FrameCodec, MAX_FRAME_LEN};
pub use frame::{Frame, HistoryEntry};
