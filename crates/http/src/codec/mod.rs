//! HTTP codec module for encoding and decoding HTTP messages
//!
//! - Request side: [`RequestDecoder`] parses the head with the header decoder, then
//!   collects the body with a payload decoder chosen from the framing headers.
//! - Response side: [`ResponseEncoder`] writes the head with the header encoder, then the
//!   body with a payload encoder matching the announced framing.
//!
//! Both plug into `tokio_util::codec::{FramedRead, FramedWrite}`.

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use request_decoder::{RequestDecoder, DEFAULT_MAX_BODY_SIZE};
pub use response_encoder::ResponseEncoder;
