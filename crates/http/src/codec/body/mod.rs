//! HTTP body framing for request and response payloads.
//!
//! ## Decoders
//! - `ChunkedDecoder`: chunked transfer coding
//! - `LengthDecoder`: `Content-Length` delimited bodies
//! - [`PayloadDecoder`]: picks one of the above, or no body
//!
//! ## Encoders
//! - `ChunkedEncoder`: chunked transfer coding
//! - `LengthEncoder`: `Content-Length` delimited bodies
//! - [`PayloadEncoder`]: picks one of the above, or writes nothing

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
