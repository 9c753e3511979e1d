//! A typewriter effect for printing a short terminal script.
//!
//! Lines starting with `>` are "typed" one character at a time, other
//! lines appear at once. The effect is a plain iterator of frames, so the
//! caller decides how to sleep and draw.

use std::time::Duration;

const INITIAL_PAUSE: Duration = Duration::from_millis(500);
const OUTPUT_PAUSE: Duration = Duration::from_millis(300);
const LINE_PAUSE: Duration = Duration::from_millis(400);

/// One step of the animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    /// How long to wait before drawing this frame.
    pub pause: Duration,
    /// Index of the line under the cursor.
    pub line: usize,
    /// The visible part of that line.
    pub visible: &'a str,
}

/// Iterator over the frames of a script.
#[derive(Clone, Debug)]
pub struct Typewriter<'a> {
    script: &'a [&'a str],
    line: usize,
    typed: usize,
    pause: Duration,
}

impl<'a> Typewriter<'a> {
    /// Creates a typewriter for `script`.
    pub fn new(script: &'a [&'a str]) -> Self {
        Self {
            script,
            line: 0,
            typed: 0,
            pause: INITIAL_PAUSE,
        }
    }
}

impl<'a> Iterator for Typewriter<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = *self.script.get(self.line)?;
        let frame = Frame {
            pause: self.pause,
            line: self.line,
            visible: text,
        };

        if !text.starts_with('>') {
            self.line += 1;
            self.pause = OUTPUT_PAUSE;
            return Some(frame);
        }

        let visible = prefix(text, self.typed);
        if visible.len() == text.len() {
            self.line += 1;
            self.typed = 0;
            self.pause = LINE_PAUSE;
        } else {
            self.pause = keystroke_pause(self.typed);
            self.typed += 1;
        }
        Some(Frame { visible, ..frame })
    }
}

/// The first `chars` characters of `text`.
fn prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// Somewhere between 30 and 80 ms, uneven like a person typing.
fn keystroke_pause(idx: usize) -> Duration {
    Duration::from_millis(30 + (idx as u64 * 37) % 51)
}
