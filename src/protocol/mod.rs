//! Chat protocol implementation
//!
//! Line framing, inbound message classification and the exact text the
//! server puts on the wire.

pub mod codec;
pub mod parser;
pub mod responses;

pub use codec::{ChatCodec, InboundLine};
pub use parser::{ChatMessage, validate_nickname};
