use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use genui::{ai, extract_code, Config, Framework, GenerationClient, GenerationRequest, Provider};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "genui")]
#[command(version, about = "Generate UI components from plain-language descriptions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Provider to use (gemini, ollama, claude, openai)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model to use instead of the configured default
    #[arg(short, long, global = true)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one component and print the extracted code
    Generate {
        /// Description of the component
        prompt: String,
        /// Target framework (html-css, html-tailwind, ...)
        #[arg(short, long)]
        framework: Option<String>,
        /// Write the code to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the supported frameworks
    Frameworks,
    /// List models for the selected provider
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging is best effort; the app runs without a log file
    if let Err(e) = genui::logging::init() {
        eprintln!("warning: {}", e);
    }

    let config = Config::load()?;
    let provider = cli
        .provider
        .as_deref()
        .map(|p| Provider::from_str(p).ok_or_else(|| anyhow!("Unknown provider: {}", p)))
        .transpose()?;

    match cli.command {
        None => run_tui(config, provider, cli.model).await,
        Some(Commands::Generate { prompt, framework, output }) => {
            generate_once(&config, provider, cli.model, &prompt, framework.as_deref(), output).await
        }
        Some(Commands::Frameworks) => {
            for framework in Framework::all() {
                println!("{:<26} {}", framework.as_str(), framework.display_name());
            }
            Ok(())
        }
        Some(Commands::Models) => {
            let provider = provider.unwrap_or_else(|| config.provider());
            let client = GenerationClient::from_config(provider, &config)?;
            for model in client.list_models(ai::LIST_MODELS_TIMEOUT).await? {
                println!("{}", model);
            }
            Ok(())
        }
    }
}

async fn run_tui(config: Config, provider: Option<Provider>, model: Option<String>) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(config, provider, model, events.sender());
    tracing::info!(provider = app.current_provider.as_str(), model = %app.selected_model, "tui started");

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            let Some(event) = events.next().await else {
                break;
            };
            handler::handle_event(&mut app, event).await?;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn generate_once(
    config: &Config,
    provider: Option<Provider>,
    model: Option<String>,
    prompt: &str,
    framework: Option<&str>,
    output: Option<PathBuf>,
) -> Result<()> {
    let framework = match framework {
        Some(name) => Framework::from_str(name).ok_or_else(|| anyhow!("Unknown framework: {}", name))?,
        None => config.framework(),
    };
    let request = GenerationRequest::new(prompt, framework)?;

    let provider = provider.unwrap_or_else(|| config.provider());
    let client = GenerationClient::from_config(provider, config)?;
    let model = model
        .or_else(|| config.default_model.clone().filter(|_| provider == config.provider()))
        .unwrap_or_else(|| ai::default_model(provider));

    tracing::info!(provider = provider.as_str(), model = %model, framework = framework.as_str(), "headless generation");
    let raw = client
        .generate(&model, &request.build_prompt(), config.request_timeout())
        .await?;
    let code = extract_code(&raw);

    match output {
        Some(path) => {
            std::fs::write(&path, &code)
                .map_err(|e| anyhow!("Cannot write {}: {}", path.display(), e))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", code),
    }
    Ok(())
}
