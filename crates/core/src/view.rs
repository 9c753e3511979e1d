use crate::conversation::Message;

/// What the widget should currently display.
///
/// A view is derived from the conversation and the request state and
/// carries nothing else, so rendering it again always gives the same
/// picture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct View {
    pub(crate) greeting: Option<String>,
    pub(crate) messages: Vec<Message>,
    pub(crate) typing: bool,
}

/// One row of the rendered message list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Row<'a> {
    /// The opening line shown above the conversation.
    Greeting(&'a str),
    /// A conversation entry.
    Message(&'a Message),
    /// The three-dot indicator shown while a reply is pending.
    Typing,
}

impl View {
    /// Returns the greeting, if any.
    #[inline]
    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    /// Returns the conversation entries in arrival order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns `true` while a reply is pending.
    #[inline]
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Returns the rows to render, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.greeting
            .as_deref()
            .map(Row::Greeting)
            .into_iter()
            .chain(self.messages.iter().map(Row::Message))
            .chain(self.typing.then_some(Row::Typing))
    }

    /// Returns the index of the row the list should be scrolled to, which
    /// is always the newest one.
    pub fn scroll_target(&self) -> Option<usize> {
        self.rows().count().checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows() {
        let mut view = View {
            greeting: Some("Hi! Ask me anything.".to_owned()),
            messages: vec![Message::user("Hello")],
            typing: true,
        };
        let rows: Vec<_> = view.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], Row::Greeting("Hi! Ask me anything."));
        assert!(matches!(rows[1], Row::Message(msg) if msg.text() == "Hello"));
        assert_eq!(rows[2], Row::Typing);
        assert_eq!(view.scroll_target(), Some(2));

        view.messages.push(Message::model("Hi there"));
        view.typing = false;
        let last = view.rows().last().unwrap();
        assert!(matches!(last, Row::Message(msg) if msg.text() == "Hi there"));
        assert_eq!(view.scroll_target(), Some(2));
    }

    #[test]
    fn test_empty_view() {
        let view = View::default();
        assert_eq!(view.rows().count(), 0);
        assert_eq!(view.scroll_target(), None);
        assert!(!view.is_typing());
        assert_eq!(view.greeting(), None);
    }
}
