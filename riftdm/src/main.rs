//! Rift DM - AI dungeon master REPL.
//!
//! A line-oriented front end for collaborative narrative play. Character
//! sheets, party order, and quest history are managed through `!commands`;
//! actions go to the AI narrator via `!askdm`.
//!
//! ```bash
//! cargo run -p riftdm -- --player rhea --log quest.log
//! ```

mod commands;

use riftdm_core::{DmNarrator, FileQuestLog, SessionConfig, SessionEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("riftdm=info,riftdm_core=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let options = Options::parse(&args);

    let client = match openrouter::OpenRouter::from_env() {
        Ok(client) => client,
        Err(_) => {
            eprintln!("Error: OPENROUTER_API_KEY environment variable not set.");
            eprintln!(
                "Please set it in .env file or with: export OPENROUTER_API_KEY=your_key_here"
            );
            std::process::exit(1);
        }
    };
    let client = match &options.model {
        Some(model) => client.with_model(model.clone()),
        None => client,
    };

    let engine = SessionEngine::new(
        SessionConfig::new(),
        DmNarrator::new(client),
        FileQuestLog::new(&options.log_path),
    );
    tracing::info!(
        player = %options.player,
        log = %options.log_path,
        "session engine ready"
    );

    commands::run_repl(engine, options.player).await?;
    Ok(())
}

/// Command line options.
struct Options {
    player: String,
    log_path: String,
    model: Option<String>,
}

impl Options {
    fn parse(args: &[String]) -> Self {
        let mut options = Self {
            player: "adventurer".to_string(),
            log_path: "quest.log".to_string(),
            model: None,
        };

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--player" => {
                    if let Some(player) = args.get(i + 1) {
                        options.player = player.clone();
                        i += 1;
                    }
                }
                "--log" => {
                    if let Some(path) = args.get(i + 1) {
                        options.log_path = path.clone();
                        i += 1;
                    }
                }
                "--model" => {
                    if let Some(model) = args.get(i + 1) {
                        options.model = Some(model.clone());
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        options
    }
}

fn print_help() {
    println!("Rift DM - AI-powered dungeon master");
    println!();
    println!("USAGE:");
    println!("  riftdm [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help        Show this help message");
    println!("  --player <ID>     Player identity for character lookups (default: adventurer)");
    println!("  --log <PATH>      Quest log file (default: quest.log)");
    println!("  --model <NAME>    Override the narration model");
    println!();
    println!("ENVIRONMENT:");
    println!("  OPENROUTER_API_KEY   Required. Loaded from .env if present.");
    println!("  RUST_LOG             Optional tracing filter (default: riftdm=info,riftdm_core=info)");
    println!();
    println!("EXAMPLES:");
    println!("  riftdm                                 # Defaults");
    println!("  riftdm --player rhea --log camp.log    # Named player, custom log");
}
