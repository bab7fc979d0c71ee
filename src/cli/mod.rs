pub mod output;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, level_filters::LevelFilter};

use crate::{
    host::{shutdown::detect_shutdown, HostModule},
    store::{backend::FileBackend, usage_store::UsageStore},
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, HOST_PREFIX},
    },
};

use output::{render_details, render_summary};

#[derive(Parser, Debug)]
#[command(name = "sitetime", version, long_about = None)]
#[command(about = "Tracks active time spent on websites", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME/sitetime or $HOME/.local/state/sitetime"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long = "utc-offset",
        global = true,
        allow_negative_numbers = true,
        help = "Offset of the local calendar from UTC in minutes. Defaults to the system offset"
    )]
    utc_offset: Option<i32>,
    #[arg(long, global = true, help = "Print responses as json")]
    json: bool,
    #[arg(long, global = true, help = "Enable logging to the console")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Add active time for a domain")]
    Record {
        #[arg(help = "Domain or url, for example www.example.com")]
        domain: String,
        #[arg(help = "Milliseconds to add")]
        ms: u64,
    },
    #[command(about = "Show today's and lifetime time for a domain")]
    Summary { domain: String },
    #[command(about = "Show calendar statistics for a domain")]
    Details { domain: String },
    #[command(about = "Hide or show the overlay for a domain")]
    Toggle { domain: String },
    #[command(about = "Answer json requests from stdin, one per line, until input ends")]
    Serve,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.clone().map_or_else(create_application_default_path, Ok)?;
    let prefix = match args.commands {
        Commands::Serve => HOST_PREFIX,
        _ => CLI_PREFIX,
    };
    let logging_level = args.log.then_some(LevelFilter::TRACE);
    enable_logging(prefix, &app_dir, logging_level, args.log)?;

    let clock = match args.utc_offset {
        Some(minutes) => DefaultClock::new(parse_offset(minutes)?),
        None => DefaultClock::system(),
    };
    let backend = FileBackend::new(app_dir.join("data"))?;
    let store = UsageStore::new(backend, Box::new(clock));

    match args.commands {
        Commands::Record { domain, ms } => {
            let outcome = store.record_time(&domain, ms).await?;
            let summary = store.get_summary(&domain).await?;
            print_with(args.json, &outcome, || render_summary(&summary));
        }
        Commands::Summary { domain } => {
            let summary = store.get_summary(&domain).await?;
            print_with(args.json, &summary, || render_summary(&summary));
        }
        Commands::Details { domain } => {
            let details = store.get_details(&domain).await?;
            print_with(args.json, &details, || render_details(&details));
        }
        Commands::Toggle { domain } => {
            store.toggle_disabled(&domain).await?;
            let summary = store.get_summary(&domain).await?;
            print_with(args.json, &summary, || render_summary(&summary));
        }
        Commands::Serve => serve(store).await?,
    }
    Ok(())
}

async fn serve(store: UsageStore<FileBackend>) -> Result<()> {
    let shutdown = CancellationToken::new();
    let host = HostModule::new(Arc::new(store), shutdown.clone());

    let (_, host_result) = tokio::join!(
        detect_shutdown(shutdown),
        host.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()),
    );

    if let Err(e) = &host_result {
        error!("Host got an error {e:?}");
    }
    host_result
}

fn parse_offset(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow!("{minutes} minutes is not a valid UTC offset"))
}

fn print_with<T: Serialize>(json: bool, value: &T, render: impl FnOnce() -> String) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(v) => println!("{v}"),
            Err(e) => error!("Failed to serialize output {e}"),
        }
    } else {
        print!("{}", render());
    }
}
