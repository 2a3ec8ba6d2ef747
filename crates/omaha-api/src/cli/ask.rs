//! One-shot client: `omaha ask <question>`.

use std::io::Write;

use console::style;

use omaha_core::chat::transcript::{Exchange, ExchangeState, Transcript, drive_exchange};
use omaha_infra::client::AskClient;
use omaha_types::chat::AskRequest;

use super::thinking_spinner;

/// Ask one question and stream the answer to stdout.
///
/// The request carries the opening greeting as history, like the first
/// question of an interactive session.
pub async fn ask_once(url: &str, question: &str) -> anyhow::Result<()> {
    let client = AskClient::new(url)?;
    let mut transcript = Transcript::with_greeting();
    let mut exchange = Exchange::new();
    let submission = transcript.begin(&mut exchange, question)?;
    let request = AskRequest::new(submission.question, submission.history);

    let spinner = thinking_spinner();
    let mut stdout = std::io::stdout();
    let exchange = drive_exchange(&mut transcript, exchange, client.ask(&request), |delta| {
        spinner.finish_and_clear();
        print!("{delta}");
        let _ = stdout.flush();
    })
    .await;
    spinner.finish_and_clear();

    match exchange.state() {
        ExchangeState::Errored(kind) => {
            eprintln!("\n{}", style(kind.apology()).yellow());
            anyhow::bail!("exchange failed ({kind:?})");
        }
        _ => {
            println!();
            Ok(())
        }
    }
}
