use clap::{value_parser, Parser, Subcommand};

pub mod args;
pub mod commands;

/// The main Rigging CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "Rigging", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// The verbosity level
    #[clap(long, short, global = true, default_value_t = 2, value_parser = value_parser!(u8).range(..=4))]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
        .into()
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the addresses derived from a mnemonic
    #[command(name = "accounts")]
    Accounts(commands::AccountsCommand),

    /// Send one JSON-RPC call through a provider pipeline
    #[command(name = "rpc")]
    Rpc(commands::RpcCommand),
}

pub fn run() -> eyre::Result<()> {
    let cli = Cli::parse();

    let level = cli.get_log_level();
    let targets = format!("rigging={level},rigging_provider={level},rigging_primitives={level}");
    let rust_log = match std::env::var("RUST_LOG") {
        Ok(val) => format!("{val},{targets}"),
        Err(_) => targets,
    };
    std::env::set_var("RUST_LOG", rust_log);
    tracing_subscriber::fmt::init();

    match cli.command {
        Commands::Accounts(command) => command.execute(),
        Commands::Rpc(command) => {
            let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
            rt.block_on(command.execute())
        }
    }
}
