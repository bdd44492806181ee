#![warn(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use log::info;

use errata_resolver::batch::{run_batch, run_single};
use errata_resolver::config::{get_config, Config, DatabaseConfig};
use errata_resolver::postgres::PgCatalog;
use errata_resolver::resolver::ErrataResolver;
use errata_resolver::server::serve;
use errata_resolver::utils::read_identifiers;

const MODES: &str = "\
This runs in three modes.
Example:
errata-resolver --pkg firefox-52.3.0-2.el7_4.i686     # stdout output
errata-resolver --pkgfile ~/file-with-nevra-per-line  # stdout output
errata-resolver --api                                 # HTTP API";

/// Find the security errata that apply to newer builds of an installed package.
#[derive(Debug, Parser)]
#[command(name = "errata-resolver", version, after_help = MODES)]
struct Args {
    /// configuration file (default: ./errata-resolver.toml, then /etc/errata-resolver/)
    #[arg(long)]
    config: Option<PathBuf>,

    /// database name to connect to
    #[arg(short = 'd', long)]
    dbname: Option<String>,

    /// database user name
    #[arg(short = 'U', long)]
    username: Option<String>,

    /// password to use
    #[arg(short = 'W', long)]
    password: Option<String>,

    /// database server host
    #[arg(long)]
    host: Option<String>,

    /// database server port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// package to query
    #[arg(long, conflicts_with_all = ["pkgfile", "api"])]
    pkg: Option<String>,

    /// read package names from file, one per line
    #[arg(long, conflicts_with = "api")]
    pkgfile: Option<PathBuf>,

    /// run in API mode
    #[arg(long)]
    api: bool,
}

impl Args {
    fn override_database(&self, database: &mut DatabaseConfig) {
        if let Some(name) = &self.dbname {
            database.name = name.clone();
        }
        if let Some(user) = &self.username {
            database.user = user.clone();
        }
        if let Some(password) = &self.password {
            database.password = password.clone();
        }
        if let Some(host) = &self.host {
            database.host = host.clone();
        }
        if let Some(port) = self.port {
            database.port = port;
        }
    }
}

async fn connect(config: &Config) -> Result<ErrataResolver, String> {
    let catalog = PgCatalog::connect(&config.database)
        .await
        .map_err(|error| error.to_string())?;

    Ok(ErrataResolver::new(Arc::new(catalog))
        .with_ordering(config.resolver.epoch_policy.ordering())
        .with_timeout(config.resolver.deadline()))
}

#[tokio::main]
async fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if !args.api && args.pkg.is_none() && args.pkgfile.is_none() {
        Args::command().print_help().map_err(|error| error.to_string())?;
        return Ok(());
    }

    let mut config = get_config(args.config.as_deref())?;
    args.override_database(&mut config.database);

    if let Some(package) = &args.pkg {
        let records = run_single(package, || connect(&config)).await?;

        for record in records {
            println!("{}", serde_json::to_string(&record).map_err(|error| error.to_string())?);
        }

        return Ok(());
    }

    let resolver = connect(&config).await?;

    if args.api {
        return serve(resolver, &config.server.address).await;
    }

    if let Some(path) = &args.pkgfile {
        let identifiers = read_identifiers(path)?;
        let total = identifiers.len();

        let outcomes = run_batch(&resolver, identifiers, config.resolver.workers).await;

        let mut failed = 0;
        for outcome in &outcomes {
            match outcome.to_json_lines() {
                Ok(lines) => lines.iter().for_each(|line| println!("{}", line)),
                Err(_) => failed += 1,
            }
        }

        info!("Finished resolving errata for {} package(s).", total);

        if failed > 0 {
            return Err(format!("Failed to resolve errata for {} of {} package(s).", failed, total));
        }
    }

    Ok(())
}
