//! Terminal chat shell.
//!
//! Reads one line per message. `/voice` takes the next message from speech
//! input, `/reset` clears the conversation and `/quit` exits.

use std::io;

use helpdesk_chat::{ConversationOrchestrator, SubmitOutcome, VoiceInterface};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const HELP: &[u8] = b"/voice  speak your next message\n/reset  start over\n/quit   exit\n";

enum Command<'a> {
    Quit,
    Reset,
    Voice,
    Help,
    Say(&'a str),
}

fn parse(line: &str) -> Command<'_> {
    match line.trim() {
        "/quit" | "/exit" => Command::Quit,
        "/reset" => Command::Reset,
        "/voice" => Command::Voice,
        "/help" => Command::Help,
        _ => Command::Say(line),
    }
}

/// Run the shell until `/quit` or end of input.
pub async fn run<R, W>(
    orchestrator: &ConversationOrchestrator,
    voice: &VoiceInterface,
    greeting: &str,
    input: R,
    mut output: W,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    output
        .write_all(format!("Assistant: {}\n", greeting).as_bytes())
        .await?;
    output.write_all(b"(type /help for commands)\n> ").await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let text = match parse(&line) {
            Command::Quit => break,
            Command::Help => {
                output.write_all(HELP).await?;
                None
            }
            Command::Reset => {
                orchestrator.reset();
                output.write_all(b"(conversation cleared)\n").await?;
                None
            }
            Command::Voice => match voice.listen().await {
                Ok(heard) => {
                    output
                        .write_all(format!("You (voice): {}\n", heard).as_bytes())
                        .await?;
                    Some(heard)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Voice input failed");
                    output.write_all(format!("({})\n", e).as_bytes()).await?;
                    None
                }
            },
            Command::Say(text) => Some(text.to_string()),
        };

        if let Some(text) = text {
            match orchestrator.submit(&text).await {
                SubmitOutcome::Answered(reply) | SubmitOutcome::Fallback(reply) => {
                    output
                        .write_all(format!("Assistant: {}\n", reply.text).as_bytes())
                        .await?;
                    voice.announce(&reply);
                }
                SubmitOutcome::Ignored(_) | SubmitOutcome::Discarded => {}
            }
        }

        output.write_all(b"> ").await?;
        output.flush().await?;
    }

    output.write_all(b"\n").await?;
    output.flush().await
}
