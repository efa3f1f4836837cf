use anyhow::Result;
use clap::Parser;
use quill::agent::Agent;
use quill::cli::Cli;
use quill::gateway::OpenRouterGateway;
use quill::tools::ToolContext;
use quill::{ToolRegistry, client, config, ui};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        ui::print_fatal(&e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "info,quill=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = config::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    tracing::info!(backend = ?config.backend, model = %config.model, "starting");

    let client = client::initialize_client(&config)?;
    let gateway = OpenRouterGateway::new(client, &config);
    let registry = ToolRegistry::with_default_tools()?;
    let ctx = ToolContext::from_config(".", &config);

    let mut agent = Agent::new(Box::new(gateway), registry, ctx, &config);
    let mut input = ui::StdinInput::new();

    ui::print_banner();
    agent.run(&mut input).await
}
