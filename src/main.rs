use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use birth_plan_assist::config::{
    AppConfig, Credentials, DEFAULT_MODEL, GenerationConfig, SUPPORTED_MODELS,
};
use birth_plan_assist::dialogue::{DialogueManager, RejectReason, TurnOutcome};
use birth_plan_assist::llm::create_client;

const HELP: &str = "\
Commands:
  /plan                   show the generated birth plan
  /restart                start over
  /key <api-key> [model]  use a different API key or model
  /quit                   exit";

/// One line of terminal input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Help,
    Restart,
    Plan,
    Key {
        key: &'a str,
        model: Option<&'a str>,
    },
    Unknown(&'a str),
    Chat(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let mut words = line.split_whitespace();
        match words.next() {
            Some("/quit") | Some("/exit") => Self::Quit,
            Some("/help") => Self::Help,
            Some("/restart") => Self::Restart,
            Some("/plan") => Self::Plan,
            Some("/key") => Self::Key {
                key: words.next().unwrap_or_default(),
                model: words.next(),
            },
            Some(word) if word.starts_with('/') => Self::Unknown(word),
            _ => Self::Chat(line),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env().context("reading configuration from the environment")?;
    let client = create_client(&config.credentials, &config.generation)?;
    let manager = DialogueManager::with_client(client, &config.generation);

    eprintln!("Birth Plan Assistant v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.credentials.model);
    eprintln!("   Type a message and press Enter. /help for commands.\n");

    print_last_assistant(&manager).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => eprintln!("{HELP}"),
            Command::Restart => {
                manager.reset().await;
                print_last_assistant(&manager).await;
            }
            Command::Plan => match manager.plan().await {
                Some(generated) => println!("\n{}", generated.plan.to_markdown()),
                None => eprintln!("No birth plan yet. Say \"I'm ready\" when you are."),
            },
            Command::Key { key, model } => {
                update_key(&manager, &config.generation, key, model).await;
            }
            Command::Unknown(word) => eprintln!("Unknown command {word}.\n{HELP}"),
            Command::Chat(input) => handle_turn(&manager, input).await,
        }
        eprint!("> ");
    }

    Ok(())
}

/// Swap in a new key. Without an explicit model the one in use is kept.
async fn update_key(
    manager: &DialogueManager,
    generation: &GenerationConfig,
    key: &str,
    model: Option<&str>,
) {
    let model = match model {
        Some(model) => model.to_string(),
        None => manager
            .model()
            .await
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
    };
    if !SUPPORTED_MODELS.contains(&model.as_str()) {
        eprintln!("Note: {model} is not one of {}", SUPPORTED_MODELS.join(", "));
    }
    match Credentials::new(key, model).and_then(|creds| create_client(&creds, generation)) {
        Ok(client) => {
            manager.configure(client).await;
            eprintln!("Settings updated.");
        }
        Err(e) => eprintln!("{e}"),
    }
}

async fn handle_turn(manager: &DialogueManager, input: &str) {
    match manager.submit(input).await {
        TurnOutcome::Replied(action) => println!("\n{}\n", action.message()),
        TurnOutcome::Failed { notice, .. } => println!("\n{notice}\n"),
        TurnOutcome::PlanReady { message, plan } => {
            println!("\n{message}\n");
            println!("{}", plan.plan.to_markdown());
            eprintln!("/restart to start over.");
        }
        TurnOutcome::Rejected(RejectReason::EmptyInput) => {}
        TurnOutcome::Rejected(RejectReason::PlanReady) => {
            eprintln!("Your birth plan is ready. /plan to show it, /restart to start over.");
        }
        TurnOutcome::Rejected(reason) => eprintln!("({reason})"),
        TurnOutcome::Superseded => {}
    }
}

async fn print_last_assistant(manager: &DialogueManager) {
    if let Some(message) = manager.messages().await.last() {
        println!("{}\n", message.content);
    }
}
