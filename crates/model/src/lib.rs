//! A provider-neutral protocol for talking to generative-language models.
//!
//! The chat widget only ever needs one thing from a model: given a system
//! preamble, the previous turns and a new user message, stream back some
//! text. This crate pins that contract down so the widget can be driven
//! by a hosted service in production and by a scripted fake in tests.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
