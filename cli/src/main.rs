use std::io::{self, Write};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use visura::chat::{ChatSession, HttpRelayClient, Outcome, RelayCallError, RelayClient, TranscriptError};
use visura::llm::types::Turn;
use visura::services::relay::RelayMode;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response body is not valid JSON: {0}")]
    DecodeResponse(reqwest::Error),
    #[error("relay call failed: {0}")]
    Relay(#[from] RelayCallError),
    #[error("{0}")]
    Transcript(#[from] TranscriptError),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("stdin read failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "visura-cli", about = "Visura relay CLI")]
struct Cli {
    #[arg(long, env = "VISURA_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "VISURA_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the server health probe.
    Ping,
    /// List the tool catalog.
    Tools,
    /// Send a single prompt and print the reply.
    Ask {
        #[arg(long, value_enum, default_value_t = ModeArg::Conversation)]
        mode: ModeArg,
        prompt: String,
    },
    /// Interactive transcript. `/regen` retries the last reply, `/copy` prints
    /// it again, `/quit` exits.
    Chat {
        #[arg(long, value_enum, default_value_t = ModeArg::Conversation)]
        mode: ModeArg,
    },
    /// Generate images and print their URLs.
    Image {
        prompt: String,
        #[arg(long, default_value_t = 1)]
        amount: u8,
        #[arg(long, default_value = "512x512")]
        resolution: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Conversation,
    Code,
}

impl From<ModeArg> for RelayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Conversation => Self::Conversation,
            ModeArg::Code => Self::Code,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let relay = HttpRelayClient::new(&cli.base_url, cli.token)?;

    match cli.command {
        Command::Ping => run_ping(&relay).await,
        Command::Tools => run_tools(&relay).await,
        Command::Ask { mode, prompt } => run_ask(&relay, mode.into(), &prompt).await,
        Command::Chat { mode } => {
            run_chat(&relay, mode.into(), BufReader::new(tokio::io::stdin())).await?;
            Ok(())
        }
        Command::Image { prompt, amount, resolution } => run_image(&relay, &prompt, amount, &resolution).await,
    }
}

async fn run_ping(relay: &HttpRelayClient) -> Result<(), CliError> {
    let url = format!("{}/healthz", relay.base_url());
    let status = reqwest::get(url).await?.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_tools(relay: &HttpRelayClient) -> Result<(), CliError> {
    let url = format!("{}/api/tools", relay.base_url());
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await?;
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }
    let value = response.json::<Value>().await.map_err(CliError::DecodeResponse)?;
    print_json(&value)
}

async fn run_ask(relay: &HttpRelayClient, mode: RelayMode, prompt: &str) -> Result<(), CliError> {
    if prompt.trim().is_empty() {
        return Err(TranscriptError::EmptyPrompt.into());
    }
    let reply = relay.send(mode, &[Turn::user(prompt)]).await?;
    println!("{}", reply.display_text());
    Ok(())
}

async fn run_image(relay: &HttpRelayClient, prompt: &str, amount: u8, resolution: &str) -> Result<(), CliError> {
    let body = serde_json::json!({ "prompt": prompt, "amount": amount, "resolution": resolution });
    let text = relay.post_json("/api/image", &body).await?;
    let images = serde_json::from_str::<Vec<Value>>(&text)?;
    for url in images.iter().filter_map(|image| image.get("url").and_then(Value::as_str)) {
        println!("{url}");
    }
    Ok(())
}

// =============================================================================
// INTERACTIVE CHAT
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Prompt(&'a str),
    Regenerate,
    Copy,
    Quit,
    Skip,
}

fn parse_repl_line(line: &str) -> ReplCommand<'_> {
    match line.trim() {
        "" => ReplCommand::Skip,
        "/regen" => ReplCommand::Regenerate,
        "/copy" => ReplCommand::Copy,
        "/quit" | "/exit" => ReplCommand::Quit,
        text => ReplCommand::Prompt(text),
    }
}

async fn run_chat<R>(relay: &dyn RelayClient, mode: RelayMode, input: R) -> Result<ChatSession, CliError>
where
    R: AsyncBufRead + Unpin,
{
    let mut session = ChatSession::new(mode);
    let mut lines = input.lines();

    prompt_marker()?;
    while let Some(line) = lines.next_line().await? {
        match parse_repl_line(&line) {
            ReplCommand::Skip => {}
            ReplCommand::Quit => break,
            ReplCommand::Prompt(text) => {
                let outcome = session.submit(relay, text).await?;
                report(&session, outcome);
            }
            ReplCommand::Regenerate => match session.regenerate(relay).await {
                Ok(outcome) => report(&session, outcome),
                Err(e) => eprintln!("{e}"),
            },
            ReplCommand::Copy => {
                let last = session.entries().last().and_then(|entry| session.copy_text(entry.id));
                match last {
                    Some(text) => println!("{text}"),
                    None => eprintln!("nothing to copy"),
                }
            }
        }
        prompt_marker()?;
    }
    Ok(session)
}

fn report(session: &ChatSession, outcome: Outcome) {
    match outcome {
        Outcome::Replied => {
            if let Some(entry) = session.entries().last() {
                println!("{}", entry.turn.display_text());
            }
        }
        Outcome::Failed => {
            if let Some(error) = session.error() {
                eprintln!("{error}");
            }
            if let Some(draft) = session.draft() {
                eprintln!("(unsent: {draft})");
            }
        }
    }
}

fn prompt_marker() -> Result<(), CliError> {
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
