//! Interactive chat client: `omaha chat`.
//!
//! Keeps one transcript for the whole session, sends it as history with
//! every question, and prints deltas as they arrive. While an answer is
//! streaming, typed lines are refused and Ctrl+C cancels the exchange.

pub mod input;

use std::io::Write;

use console::style;

use omaha_core::chat::transcript::{Exchange, ExchangeState, Transcript, drive_exchange};
use omaha_infra::client::AskClient;
use omaha_types::chat::{AskRequest, GREETING};

use self::input::{ChatInput, InputEvent};
use super::thinking_spinner;

enum Turn {
    Finished(Exchange),
    Cancelled,
    Quit,
}

/// Run the interactive chat loop against the relay at `url`.
pub async fn run_chat_loop(url: &str) -> anyhow::Result<()> {
    let client = AskClient::new(url)?;
    let mut transcript = Transcript::with_greeting();
    let (mut input, mut out) = ChatInput::new("you › ".to_string())?;

    writeln!(
        out,
        "\n  {} {}\n",
        style("Omaha").cyan().bold(),
        style(format!("connected to {}", client.url())).dim()
    )?;
    writeln!(out, "{}\n", style(GREETING).green())?;
    writeln!(out, "  {}\n", style("Ctrl+D or /quit to leave").dim())?;

    loop {
        let text = match input.read_line().await {
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) if matches!(text.as_str(), "/quit" | "/exit") => break,
            InputEvent::Message(text) => text,
            InputEvent::Interrupted => continue,
            InputEvent::Eof => break,
        };

        let mut exchange = Exchange::new();
        let submission = match transcript.begin(&mut exchange, &text) {
            Ok(submission) => submission,
            Err(err) => {
                writeln!(out, "{}", style(err).yellow())?;
                continue;
            }
        };
        let request = AskRequest::new(submission.question, submission.history);

        let spinner = thinking_spinner();
        let mut delta_out = out.clone();
        let turn = {
            let drive = drive_exchange(&mut transcript, exchange, client.ask(&request), |delta| {
                spinner.finish_and_clear();
                let _ = write!(delta_out, "{delta}");
            });
            let mut drive = std::pin::pin!(drive);

            loop {
                tokio::select! {
                    exchange = &mut drive => break Turn::Finished(exchange),
                    event = input.read_line() => match event {
                        InputEvent::Message(_) => {
                            writeln!(out, "{}", style("Still answering, please wait...").dim())?;
                        }
                        InputEvent::Interrupted => break Turn::Cancelled,
                        InputEvent::Eof => break Turn::Quit,
                    },
                }
            }
        };
        spinner.finish_and_clear();

        match turn {
            Turn::Finished(exchange) => match exchange.state() {
                ExchangeState::Errored(kind) => {
                    tracing::debug!(?kind, "Exchange failed");
                    writeln!(out, "\n{}\n", style(kind.apology()).yellow())?;
                }
                _ => writeln!(out, "\n")?,
            },
            Turn::Cancelled => writeln!(out, "\n{}\n", style("(cancelled)").dim())?,
            Turn::Quit => break,
        }
    }

    input.flush();
    Ok(())
}
