//! Core logic of the portfolio assistant: the conversation log, the
//! request dispatcher and the widget that ties them to a view.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod dispatcher;
mod model_client;
mod view;
mod widget;

pub use dispatcher::{
    APOLOGY_MESSAGE, CONFIGURATION_MESSAGE, Dispatcher, EMPTY_REPLY_MESSAGE,
};
pub use view::{Row, View};
pub use widget::{RequestState, Widget, WidgetBuilder, WidgetClosedError};
