use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use flashgen::commands::{generate, history, plan};
use flashgen::config::Settings;
use flashgen::crud::DB;
use flashgen::llm::{self, AuthStore, provider_for};
use flashgen::logging;

#[derive(Parser, Debug)]
#[command(
    name = "flashgen",
    version,
    about = "AI-generated flashcards for any topic, in your terminal.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate ten flashcards about a topic
    Generate {
        /// Topic to study, e.g. "World War II"
        #[arg(value_name = "TOPIC", num_args = 1.., required = true)]
        topic: Vec<String>,
        /// Save the generated set for the signed-in user
        #[arg(long, default_value_t = false)]
        save: bool,
        /// Print the cards instead of opening the card viewer
        #[arg(long, default_value_t = false)]
        plain: bool,
    },
    /// List saved flashcard sets
    History {
        /// Maximum number of sets to list
        #[arg(long, value_name = "COUNT", default_value_t = 20)]
        limit: u32,
    },
    /// Open a saved flashcard set
    Show {
        /// Set id, as listed by `history`
        #[arg(value_name = "ID")]
        id: i64,
        #[arg(long, default_value_t = false)]
        plain: bool,
    },
    /// Show the current plan and today's usage
    Plan,
    /// Manage the generation service API key
    Llm {
        /// Store a new API key in the local auth file
        #[arg(long, value_name = "KEY", conflicts_with = "clear")]
        set: Option<String>,
        /// Remove the stored API key from the local auth file
        #[arg(long, conflicts_with = "test")]
        clear: bool,
        /// Verify the configured API key against the generation service
        #[arg(long, conflicts_with = "clear")]
        test: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    logging::init(&settings.log_filter);

    if let Command::Llm { set, clear, test } = cli.command {
        return handle_llm_command(&settings, set, clear, test).await;
    }

    let db = DB::new().await?;
    let result = match cli.command {
        Command::Generate { topic, save, plain } => {
            generate::run(&db, &settings, &topic.join(" "), save, plain).await
        }
        Command::History { limit } => history::list(&db, &settings.identity, limit).await,
        Command::Show { id, plain } => history::show(&db, &settings.identity, id, plain).await,
        Command::Plan => plan::run(&db, &settings).await,
        Command::Llm { .. } => Ok(()),
    };
    db.close().await;

    result
}

async fn handle_llm_command(
    settings: &Settings,
    set: Option<String>,
    clear: bool,
    test: bool,
) -> Result<()> {
    let store = AuthStore::open_default()?;
    let provider = provider_for(&settings.generation.endpoint);
    let mut action_taken = false;

    if let Some(key) = set {
        store.store(&provider, &key)?;
        println!("Stored the API key for {provider} in the local auth file.");
        action_taken = true;
    }

    if clear {
        if store.clear(&provider)? {
            println!("Removed the stored API key for {provider}.");
        } else {
            println!("No API key for {provider} found in the auth file.");
        }
        action_taken = true;
    }

    if test {
        let source = llm::test_configured_api_key(&settings.generation, &store).await?;
        println!("API key from the {} is valid.", source.description());
        action_taken = true;
    }

    if !action_taken {
        bail!("No action provided. Use --set, --clear, or --test.");
    }
    Ok(())
}
