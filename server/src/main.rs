mod config;
mod directory;
mod graphql;
mod http;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use products_hr::Employee;
use tracing::info;

use crate::{
    config::AppConfig,
    directory::Directory,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "employee-directory", version, about = "Employee directory service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Write a demo snapshot to EMPLOYEE_SNAPSHOT_PATH.
    Seed {
        #[arg(long, help = "Overwrite an existing snapshot")]
        force: bool,
    },
    /// Print the GraphQL schema.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app_config = Arc::new(AppConfig::load()?);
    init_tracing(ObsConfig::for_service(app_config.service_name.clone()))?;
    let result = match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::Seed { force } => run_seed(&app_config, force).await,
        Command::SchemaPrint { output } => schema_print(output),
    };
    shutdown_tracing();
    result
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let directory = Directory::open(config.snapshot.open()).await?;
    let schema = graphql::build_schema(directory.clone());
    let state = AppState {
        directory,
        schema,
        config,
    };
    http::serve(cmd.into(), state).await
}

async fn run_seed(config: &AppConfig, force: bool) -> Result<()> {
    let Some(snapshot) = config.snapshot.open() else {
        bail!("EMPLOYEE_SNAPSHOT_PATH is not set; nothing to seed");
    };
    if snapshot.exists().await && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            snapshot.path().display()
        );
    }
    let directory = Directory::new(Default::default(), Some(snapshot));
    for employee in demo_employees()? {
        directory.store().add(employee)?;
    }
    directory.try_persist().await?;
    info!(employees = directory.store().len(), "demo snapshot written");
    Ok(())
}

fn demo_employees() -> Result<Vec<Employee>> {
    let date = |y, m, d| {
        NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid demo date {y}-{m}-{d}"))
    };
    Ok(vec![
        Employee::new("Ada", "Lovelace", date(1815, 12, 10)?).with_email("ada@example.com"),
        Employee::new("Grace", "Hopper", date(1906, 12, 9)?),
        Employee::new("Alan", "Turing", date(1912, 6, 23)?).with_email("alan.turing@example.com"),
    ])
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let sdl = graphql::build_schema(Directory::in_memory()).sdl();
    match path {
        Some(target) => {
            std::fs::write(&target, sdl)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "schema written");
        }
        None => println!("{sdl}"),
    }
    Ok(())
}
