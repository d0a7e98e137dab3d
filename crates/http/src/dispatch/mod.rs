//! Method based request dispatch
//!
//! [`Dispatcher`] maps each supported [`Method`] to exactly one handler and converts every
//! outcome, including unknown methods and failing handlers, into a response.

mod builtin;
mod dispatcher;
mod method;

pub use dispatcher::{Dispatcher, DispatcherBuilder, ResponseBody};
pub use method::{Method, UnsupportedMethod, ALLOWED_METHODS};
