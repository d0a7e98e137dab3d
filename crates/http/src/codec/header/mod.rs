//! Request head decoding and response head encoding.
//!
//! - [`HeaderDecoder`]: request-line and header block parsing, body framing selection
//! - [`HeaderEncoder`]: status line, framing header and header block serialization

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
