//! Run one smartcollect prompt task from the command line and print the
//! validated JSON result.
//!
//! Reads the API key from the `OPENROUTER_KEY` environment variable unless
//! `--offline` is given.
//!
//! # Examples
//!
//! ```sh
//! # Score a case
//! smartcollect prioritize --overdue-aging 45 --due-amount 10000 \
//!   --recovery-rate 0.6 --has-overdue-history 0
//!
//! # Evaluate an agent from a history file
//! smartcollect analyze --dca-id dca-1 --history-file john.txt
//!
//! # Pick a contact channel, show the rendered prompt, no network
//! echo "- Called twice, no answer." | smartcollect --offline --show-prompt suggest --stdin
//! ```

use std::io::{self, Read};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use smartcollect::backend::{ChatBackend, ScriptedBackend};
use smartcollect::tasks::{
    AnalyzeDcaPerformance, ChannelInput, PerformanceInput, PrioritizeCases, PriorityInput,
    PromptTask, SuggestCommunicationMode, TaskConfig, TaskRunner,
};
use smartcollect::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, OpenRouterClient};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run one smartcollect prompt task and print the validated result.
#[derive(Parser)]
#[command(name = "smartcollect")]
struct Cli {
    #[command(subcommand)]
    task: TaskCommand,

    /// Model to use.
    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    model: String,

    /// Maximum tokens in the reply.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Sampling temperature.
    #[arg(long, global = true, default_value_t = 0.2)]
    temperature: f32,

    /// Answer with canned replies instead of calling the model.
    #[arg(long, global = true)]
    offline: bool,

    /// Print the rendered prompt to stderr before sending it.
    #[arg(long, global = true)]
    show_prompt: bool,

    /// Log verbosity on stderr (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Score how urgently a case should be worked (0-100).
    Prioritize {
        #[arg(long)]
        overdue_aging: u32,
        #[arg(long)]
        due_amount: f64,
        #[arg(long)]
        recovery_rate: f64,
        #[arg(long, default_value_t = 0)]
        has_overdue_history: u32,
    },
    /// Summarize an agent's performance and recommend assignments.
    Analyze {
        #[arg(long)]
        dca_id: String,
        #[command(flatten)]
        history: HistoryArgs,
    },
    /// Recommend calling, email or messaging for a debtor.
    Suggest {
        #[command(flatten)]
        history: HistoryArgs,
    },
}

#[derive(clap::Args)]
struct HistoryArgs {
    /// History text.
    #[arg(long, conflicts_with_all = ["history_file", "stdin"])]
    history: Option<String>,

    /// Read the history from a file.
    #[arg(long, conflicts_with = "stdin")]
    history_file: Option<String>,

    /// Read the history from stdin.
    #[arg(long)]
    stdin: bool,
}

impl HistoryArgs {
    fn resolve(&self) -> Result<String, String> {
        if let Some(ref text) = self.history {
            return Ok(text.clone());
        }
        if let Some(ref path) = self.history_file {
            return std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {path}: {e}"));
        }
        if self.stdin {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            return Ok(buf);
        }
        Err("one of --history, --history-file or --stdin is required".into())
    }
}

async fn run_task<T: PromptTask>(
    runner: &TaskRunner<'_>,
    input: &T::Input,
    show_prompt: bool,
) -> Result<String, String> {
    if show_prompt {
        let prompt = runner.render::<T>(input).map_err(|e| e.to_string())?;
        eprintln!("── prompt ({}) ──\n{prompt}\n", T::NAME);
    }
    let output = runner.run::<T>(input).await.map_err(|e| {
        info!("{} failed: {e}", T::NAME);
        format!("{} ({e})", e.user_message())
    })?;
    serialize_pretty(&output)
}

fn serialize_pretty(value: &impl Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to serialize result: {e}"))
}

async fn execute(cli: Cli) -> Result<String, String> {
    let backend: Box<dyn ChatBackend> = if cli.offline {
        Box::new(ScriptedBackend::offline())
    } else {
        let api_key = std::env::var("OPENROUTER_KEY")
            .map_err(|_| "OPENROUTER_KEY environment variable not set".to_string())?;
        Box::new(OpenRouterClient::new(api_key)?)
    };

    let config = TaskConfig::default()
        .with_model(cli.model)
        .with_max_tokens(cli.max_tokens)
        .with_temperature(cli.temperature);
    let runner = TaskRunner::new(backend.as_ref(), config);

    match cli.task {
        TaskCommand::Prioritize {
            overdue_aging,
            due_amount,
            recovery_rate,
            has_overdue_history,
        } => {
            let input = PriorityInput {
                overdue_aging,
                due_amount,
                recovery_rate,
                has_overdue_history,
            };
            run_task::<PrioritizeCases>(&runner, &input, cli.show_prompt).await
        }
        TaskCommand::Analyze { dca_id, history } => {
            let input = PerformanceInput {
                dca_id,
                case_history: history.resolve()?,
            };
            run_task::<AnalyzeDcaPerformance>(&runner, &input, cli.show_prompt).await
        }
        TaskCommand::Suggest { history } => {
            let input = ChannelInput {
                case_history: history.resolve()?,
            };
            run_task::<SuggestCommunicationMode>(&runner, &input, cli.show_prompt).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(cli.log_level)
        .init();

    match execute(cli).await {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
