//! Core HTTP protocol types shared by the codec, the connection and the dispatcher.
//!
//! - **Message Handling** (`message`): [`Message`], [`PayloadItem`] and [`PayloadSize`]
//!   describe a message as a head followed by framed payload chunks.
//! - **Request Processing** (`request`): [`RequestHeader`] wraps the parsed request head.
//! - **Response Processing** (`response`): [`ResponseHead`] is the response before its body
//!   is attached.
//! - **Error Handling** (`error`): [`HttpError`], [`ParseError`] and [`SendError`].

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHeader;

mod response;
pub use response::BodyOmitted;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
