//! Event decoding for the live stream.
//!
//! Raw message shape:
//!
//! ```text
//! { "id"?: u64, "argument_id"?: str, "event_type": str,
//!   "turn_index": number | null, "payload": object, "created_at"?: rfc3339 }
//! ```

pub mod decoder;
pub mod types;

pub use decoder::{decode, DecodeError, Decoded};
pub use types::{kinds, Envelope, StreamEvent};
