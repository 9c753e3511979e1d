//! Chat with the portfolio assistant in the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use folio::SessionBuilder;
use folio::core::View;
use folio::core::conversation::{Role, accept_user_input};
use folio::typewriter::Typewriter;
use folio_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Changed(View),
    Idle,
}

const BAR_CHAR: &str = "▎";

const PROFILE_SCRIPT: &[&str] = &[
    "> import sys",
    "> from dauda_nasir import Profile",
    "> loading profile...",
    "> print(Profile.bio)",
    "----------------------------------------",
    "ROLE: Senior Software Engineer",
    "FOCUS: Scalable Systems & AI",
    "STACK: Python, Flutter, TensorFlow, AWS",
    "STATUS: Ready for new challenges...",
    "----------------------------------------",
];

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = GeminiConfigBuilder::from_env().build();
    if !config.has_api_key() {
        warn!("GEMINI_API_KEY is not set, the assistant cannot reply");
    }
    debug!("using {config:?}");
    let model_provider = GeminiProvider::new(config);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let session = SessionBuilder::with_model_provider(model_provider)
        .on_change({
            let event_tx = event_tx.clone();
            move |view| {
                event_tx.send(SessionEvent::Changed(view.clone())).ok();
            }
        })
        .on_idle(move || {
            event_tx.send(SessionEvent::Idle).ok();
        })
        .build();

    if env::var_os("FOLIO_NO_BANNER").is_none() {
        play_banner().await;
    }

    let Ok(view) = session.snapshot().await else {
        error!("session closed before it started");
        return;
    };
    if let Some(greeting) = view.greeting() {
        print_reply(greeting);
    }

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let mut stdin = BufReader::new(io::stdin()).lines();
    let mut rendered = view.messages().len();

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = match stdin.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("error reading input: {}", err);
                break;
            }
        };
        if accept_user_input(&line).is_none() {
            continue;
        }
        if session.send_message(&line).is_err() {
            break;
        }

        let mut progress_bar: Option<ProgressBar> = None;

        loop {
            if let Some(progress_bar) = &progress_bar {
                progress_bar.inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            match event {
                SessionEvent::Changed(view) => {
                    // Finish the progress bar before printing anything else.
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }

                    // The user's own lines are already on screen.
                    for msg in view.messages().iter().skip(rendered) {
                        if msg.role() == Role::Model {
                            print_reply(msg.text());
                        }
                    }
                    rendered = view.messages().len();

                    if view.is_typing() {
                        let bar = ProgressBar::new_spinner();
                        bar.set_style(progress_style.clone());
                        bar.set_message("typing...");
                        progress_bar = Some(bar);
                    }
                }
                SessionEvent::Idle => {
                    break;
                }
            }
        }
    }
}

fn print_reply(text: &str) {
    println!("{}✨ {}", BAR_CHAR.bright_cyan(), text.bright_white());
}

async fn play_banner() {
    let mut stdout = std::io::stdout();
    let mut current_line = None;
    let mut printed = 0;

    for frame in Typewriter::new(PROFILE_SCRIPT) {
        sleep(frame.pause).await;
        if current_line != Some(frame.line) {
            if current_line.is_some() {
                println!();
            }
            current_line = Some(frame.line);
            printed = 0;
        }
        let typed = &frame.visible[printed..];
        print!("{}", typed.green());
        printed = frame.visible.len();
        stdout.flush().ok();
    }
    println!("\n");
}
