//! The portfolio assistant, ready to chat.
//!
//! The crate includes a CLI tool for chatting in the terminal. It can
//! also be used as a library to put the assistant into another host app.

#![deny(missing_docs)]

mod session;
pub mod typewriter;

pub use session::{GREETING, PERSONA, Session, SessionBuilder};

/// Re-exports of [`folio_core`] crate.
pub mod core {
    pub use folio_core::*;
}
