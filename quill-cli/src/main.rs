use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use quill_cli::browser::{CdpSession, PageChannel};
use quill_cli::controller::run_generate;
use quill_core::{QuillConfig, SettingsStore};

#[derive(Parser, Debug)]
#[command(
    name = "quill",
    version,
    about = "Draft replies to social posts from a screenshot of the active browser tab"
)]
struct Cli {
    /// Config file; defaults apply when it does not exist
    #[arg(short, long, default_value = "quill.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Capture the active post, draft a reply, and inject it into the page
    Generate,
    /// Check that the attached page answers the injector liveness probe
    Probe,
    /// Manage the stored credential and drafting instructions
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Show where settings live and what is configured
    Show,
    /// Store the OpenAI API key
    SetKey { key: String },
    /// Store drafting instructions from a file, or `-` for stdin
    SetInstructions { file: String },
    /// Restore the bundled default instructions
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — OPENAI_API_KEY fallback)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let config = match QuillConfig::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", cli.config, e);
            std::process::exit(1);
        }
    };

    let settings_path = shellexpand::tilde(&config.settings.path).into_owned();
    let settings = SettingsStore::load(settings_path)?;

    match cli.command {
        Commands::Generate => {
            let session = CdpSession::connect(&config.browser, &config.injector).await?;
            match run_generate(&settings, &config, &session).await {
                Ok(comment) => println!("{comment}"),
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Probe => {
            let session = CdpSession::connect(&config.browser, &config.injector).await?;
            let url = session.current_url().await?;
            if session.probe().await {
                println!("✅ injector ready on {url}");
            } else {
                eprintln!("❌ page at {url} did not answer the probe");
                std::process::exit(1);
            }
        }
        Commands::Settings { command } => match command {
            SettingsCommand::Show => {
                println!("settings file: {}", settings.path().display());
                let key = settings.api_key();
                if key.is_empty() {
                    println!("api key: (not set)");
                } else {
                    println!("api key: ...{}", &key[key.len().saturating_sub(4)..]);
                }
                println!(
                    "instructions: {}",
                    if settings.has_custom_instructions() {
                        "custom"
                    } else {
                        "bundled default"
                    }
                );
            }
            SettingsCommand::SetKey { key } => {
                if !key.starts_with("sk-") {
                    eprintln!("warning: API key does not start with \"sk-\"");
                }
                settings.set_api_key(&key)?;
                println!("✅ API key saved");
            }
            SettingsCommand::SetInstructions { file } => {
                let text = if file == "-" {
                    let mut buf = String::new();
                    std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
                    buf
                } else {
                    std::fs::read_to_string(&file)?
                };
                if text.trim().is_empty() {
                    eprintln!("Instructions cannot be empty");
                    std::process::exit(1);
                }
                settings.set_instructions(&text)?;
                println!("✅ instructions saved");
            }
            SettingsCommand::Reset => {
                settings.reset_instructions()?;
                println!("✅ instructions reset to bundled default");
            }
        },
    }

    Ok(())
}
