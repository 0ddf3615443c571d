//! wallaroo: command line client for a Wallaroo configuration service.
//!
//! # Usage
//!
//! ```bash
//! # List broker users at the current tag
//! wallaroo list-users
//!
//! # Show one user on a branch
//! wallaroo --branch dev show-user alice
//!
//! # Grant a role (creates the user if needed)
//! wallaroo --host wallaby.example.com set-user-role alice admin
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use wallaroo_core::{ConnectionOptions, Error};

#[derive(Parser, Debug)]
#[command(name = "wallaroo")]
#[command(author = "Wallaroo Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Manage Wallaroo broker users and roles")]
struct Cli {
    /// JSON file with connection options
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Service host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Service port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// http or https
    #[arg(long, global = true)]
    scheme: Option<String>,

    #[arg(short, long, global = true)]
    username: Option<String>,

    #[arg(long, global = true, env = "WALLAROO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Wallaby secret key (takes precedence over WALLABY_SECRET in environment)
    #[arg(short, long, global = true, env = "WALLABY_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Follow the head of a branch
    #[arg(long, global = true, conflicts_with_all = ["tag", "commit"])]
    branch: Option<String>,

    /// Read from a tag (default: current)
    #[arg(long, global = true, conflicts_with = "commit")]
    tag: Option<String>,

    /// Read from a specific commit
    #[arg(long, global = true)]
    commit: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lists Wallaby roles for broker users
    #[command(name = "list-users")]
    ListUsers,

    /// Shows the attributes of one broker user
    #[command(name = "show-user")]
    ShowUser {
        /// User name
        name: String,
    },

    /// Updates the Wallaby role of a broker user
    #[command(name = "set-user-role")]
    SetUserRole {
        /// User name
        name: String,
        /// Role to grant
        role: String,
    },
}

impl Cli {
    /// Connection options from flags, layered over the config file if any.
    fn connection_options(&self) -> wallaroo_core::Result<ConnectionOptions> {
        let base = match &self.config {
            Some(path) => ConnectionOptions::load(path)?,
            None => ConnectionOptions::default(),
        };
        Ok(base.merge(ConnectionOptions {
            host: self.host.clone(),
            port: self.port,
            scheme: self.scheme.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            secret: self.secret.clone(),
            branch: self.branch.clone(),
            tag: self.tag.clone(),
            commit: self.commit.clone(),
        }))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("wallaroo_cli=info".parse().unwrap())
            .add_directive("wallaroo_core=info".parse().unwrap())
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("wallaroo: {:#}", err);
            let code = err
                .downcast_ref::<Error>()
                .map(Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = cli.connection_options()?;
    let mut out = std::io::stdout().lock();

    match &cli.command {
        Commands::ListUsers => commands::list_users(options, &mut out),
        Commands::ShowUser { name } => commands::show_user(options, name, &mut out),
        Commands::SetUserRole { name, role } => commands::set_user_role(options, name, role),
    }
}
