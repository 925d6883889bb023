mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Consent { action } => commands::consent::run(action),
        Commands::Session => commands::session::run(),
        Commands::Device { user_agent } => commands::device::run(&user_agent),
        Commands::Track(args) => commands::track::run(args),
        Commands::Event(args) => commands::event::run(args),
        Commands::Replay { file } => commands::replay::run(&file),
        Commands::History { stats, job } => commands::history::run(stats, job.as_deref()),
        Commands::Version => commands::version::run(),
    }
}
