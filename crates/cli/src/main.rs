mod config;
mod error;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use runtime::{Agent, Backend, GeminiBackend, Session, ToolManager, describe_builtin_tools};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::Config;
use error::{Error, Result};

const API_KEY_VAR: &str = "GEMINI_API_KEY";
const WEATHER_KEY_VAR: &str = "WEATHER_API_KEY";
const EXIT_WORDS: &[&str] = &["quit", "exit", "bye", "q"];

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "Answer questions with an LLM and a small set of tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./deckhand.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Question to answer
    question: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        #[arg(hide = true)]
        rest: Vec<String>,
    },
    /// List the available tools
    Tools {
        #[arg(hide = true)]
        rest: Vec<String>,
    },
}

/// What the command line asks for.
#[derive(Debug, PartialEq)]
enum Request {
    Ask(String),
    Chat,
    Tools,
    Usage,
}

impl Cli {
    /// Words after `chat` or `tools` make the whole line a question.
    fn request(&self) -> Request {
        match &self.command {
            Some(Commands::Chat { rest }) if rest.is_empty() => Request::Chat,
            Some(Commands::Tools { rest }) if rest.is_empty() => Request::Tools,
            Some(Commands::Chat { rest }) => Request::Ask(format!("chat {}", rest.join(" "))),
            Some(Commands::Tools { rest }) => Request::Ask(format!("tools {}", rest.join(" "))),
            None => {
                let question = self.question.join(" ");
                if question.trim().is_empty() {
                    Request::Usage
                } else {
                    Request::Ask(question)
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run(Cli::parse(), env_var).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the command line. `env` looks up environment variables.
async fn run(cli: Cli, env: impl Fn(&str) -> Option<String>) -> Result<ExitCode> {
    let question = match cli.request() {
        Request::Usage => {
            eprintln!("{}", Cli::command().render_usage());
            return Ok(ExitCode::FAILURE);
        }
        Request::Tools => {
            println!("{}", describe_builtin_tools());
            return Ok(ExitCode::SUCCESS);
        }
        Request::Chat => None,
        Request::Ask(question) => Some(question),
    };

    let mut config = Config::discover(cli.config.as_deref())?;
    config.apply_env(&env);

    let api_key = env(API_KEY_VAR).ok_or(Error::MissingApiKey)?;
    let backend = Arc::new(build_backend(&config, api_key)?);
    let tools =
        ToolManager::with_builtin_tools(&config.builtin(env(WEATHER_KEY_VAR)), backend.clone());

    match question {
        Some(question) => println!("{}", Agent::new(backend, tools).answer(&question).await),
        None => cmd_chat(Session::new(backend, tools)).await?,
    }
    Ok(ExitCode::SUCCESS)
}

/// A set, non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn build_backend(config: &Config, api_key: String) -> Result<GeminiBackend> {
    let mut builder =
        GeminiBackend::builder(api_key, &config.model.name).timeout(config.model_timeout());
    if let Some(system) = &config.model.system {
        builder = builder.system(system);
    }
    Ok(builder.build()?)
}

enum Input<'a> {
    Skip,
    Quit,
    History,
    Tools,
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let input = line.trim();
    if input.is_empty() {
        return Input::Skip;
    }
    let lowered = input.to_lowercase();
    if EXIT_WORDS.contains(&lowered.as_str()) {
        Input::Quit
    } else if lowered == "history" {
        Input::History
    } else if lowered == "tools" {
        Input::Tools
    } else {
        Input::Question(input)
    }
}

async fn cmd_chat<B: Backend>(mut session: Session<B>) -> Result<()> {
    println!("deckhand v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", session.list_available_tools());
    println!("Type 'history' to review the conversation, 'quit' or Ctrl+D to exit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        // EOF
        let Some(line) = line else {
            println!();
            break;
        };

        match classify(&line) {
            Input::Skip => continue,
            Input::Quit => break,
            Input::History => {
                if session.history().is_empty() {
                    println!("\nNo conversation yet.\n");
                } else {
                    println!("\n{}\n", session.transcript());
                }
            }
            Input::Tools => println!("\n{}\n", session.list_available_tools()),
            Input::Question(question) => {
                let answer = tokio::select! {
                    answer = session.ask(question) => answer,
                    _ = tokio::signal::ctrl_c() => {
                        println!();
                        break;
                    }
                };
                println!("\n{answer}\n");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        for word in ["quit", "EXIT", " Bye ", "q", "Q"] {
            assert!(matches!(classify(word), Input::Quit), "{word}");
        }
        assert!(matches!(classify("quit now"), Input::Question("quit now")));
    }

    #[test]
    fn repl_commands() {
        assert!(matches!(classify("   "), Input::Skip));
        assert!(matches!(classify("History"), Input::History));
        assert!(matches!(classify("tools"), Input::Tools));
        assert!(matches!(
            classify("  what is 2 + 2?  "),
            Input::Question("what is 2 + 2?")
        ));
    }

    #[test]
    fn question_words_are_joined() {
        let cli = Cli::try_parse_from(["deckhand", "What", "is", "25", "*", "4?"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.question.join(" "), "What is 25 * 4?");
    }

    #[test]
    fn subcommands_and_config_flag() {
        let cli = Cli::try_parse_from(["deckhand", "--config", "alt.toml", "chat"]).unwrap();
        assert_eq!(cli.request(), Request::Chat);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));

        let cli = Cli::try_parse_from(["deckhand", "tools"]).unwrap();
        assert_eq!(cli.request(), Request::Tools);
    }

    #[test]
    fn questions_may_start_with_a_command_word() {
        let cli = Cli::try_parse_from(["deckhand", "tools", "for", "cooking?"]).unwrap();
        assert_eq!(cli.request(), Request::Ask("tools for cooking?".into()));

        let cli = Cli::try_parse_from(["deckhand", "chat", "about", "rust"]).unwrap();
        assert_eq!(cli.request(), Request::Ask("chat about rust".into()));
    }

    #[test]
    fn no_arguments_parse_to_nothing() {
        let cli = Cli::try_parse_from(["deckhand"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.question.is_empty());
        assert_eq!(cli.request(), Request::Usage);
    }

    fn empty_config() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    fn parse(config: &tempfile::NamedTempFile, args: &[&str]) -> Cli {
        let path = config.path().to_str().unwrap();
        let mut argv = vec!["deckhand", "--config", path];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn same_code(a: ExitCode, b: ExitCode) -> bool {
        format!("{a:?}") == format!("{b:?}")
    }

    #[tokio::test]
    async fn missing_question_exits_with_failure() {
        let config = empty_config();
        let code = run(parse(&config, &[]), |_| None).await.unwrap();
        assert!(same_code(code, ExitCode::FAILURE));

        let code = run(parse(&config, &["  "]), |_| None).await.unwrap();
        assert!(same_code(code, ExitCode::FAILURE));
    }

    #[tokio::test]
    async fn missing_api_key_is_fatal() {
        let config = empty_config();
        for args in [&["what", "is", "2+2"][..], &["chat"][..]] {
            let result = run(parse(&config, args), |_| None).await;
            assert!(matches!(result, Err(Error::MissingApiKey)), "{args:?}");
        }
    }

    #[tokio::test]
    async fn tool_listing_needs_no_api_key() {
        let config = empty_config();
        let code = run(parse(&config, &["tools"]), |_| None).await.unwrap();
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[tokio::test]
    async fn unreadable_config_is_fatal() {
        let cli = Cli::try_parse_from(["deckhand", "--config", "/nonexistent/deckhand.toml", "hi"])
            .unwrap();
        let result = run(cli, |_| Some("key".to_string())).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
