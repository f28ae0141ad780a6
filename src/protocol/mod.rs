//! Protocol module - message header and whole-message framing.
//!
//! This module carries what the body codec leaves to the caller:
//! - 25-byte header with protocol version, flags and interface version
//! - Message encode/decode around a single body value

mod header;
mod message;

pub use header::{MessageHeader, HEADER_SIZE};
pub use message::{decode_message, encode_message, encode_message_in, Message, UNVERSIONED};
