// src/main.rs
// =============================================================================
// Entry point.
//
// What happens here:
// 1. Parse command-line arguments and freeze them into a RunConfig
// 2. Load the seed package list (file or --packages) and check storage
// 3. Optionally expand the list to its dependency closure (--recursive)
// 4. Download every package's distributions
// 5. Print the report and exit (-1 for bad input, 0 otherwise; 2 is kept
//    for internal failures such as the HTTP client not building)
//
// Steps 1-2 happen before any request is sent: a bad seed file or storage
// root stops the run without touching the network.
// =============================================================================

mod cli;
mod config;
mod download;
mod error;
mod package;
mod resolve;
mod storage;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::RunConfig;
use download::{DownloadScheduler, PackageStatus, RunReport};
use error::InputError;
use log::{error, info};
use package::PackageName;
use resolve::{DependencyResolver, MetadataClient};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let code = exit_code(run().await);
    std::process::exit(code);
}

// Logs a failed run and turns it into the process exit code:
// -1 for bad input, 2 for anything unexpected.
fn exit_code(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => match e.downcast_ref::<InputError>() {
            Some(input) => {
                error!("{}", input);
                -1
            }
            None => {
                error!("{:#}", e);
                2
            }
        },
    }
}

async fn run() -> Result<i32> {
    run_with(Cli::parse()).await
}

// Returns the process exit code. Input errors come back as Err so main can
// log them in one place.
async fn run_with(cli: Cli) -> Result<i32> {
    let config = RunConfig::from_cli(&cli);

    let seed = load_seed(&cli).await?;
    storage::ensure_storage_root(&config.storage_root).await?;

    let client = reqwest::Client::builder().build()?;

    let packages: Vec<PackageName> = if cli.recursive {
        info!("Acquiring packages in dependency tree...");
        let resolver = DependencyResolver::new(MetadataClient::new(client.clone(), &config));
        let resolved = resolver.resolve(seed).await;

        package::write_seed_file(&cli.pip_list, &resolved).await?;
        info!(
            "Wrote {} package(s) to {}",
            resolved.len(),
            cli.pip_list.display()
        );
        resolved.into_iter().collect()
    } else {
        seed
    };

    let scheduler = DownloadScheduler::new(client, &config);
    let report = scheduler.download_all(&packages).await;

    print_results(&report, cli.json)?;
    Ok(0)
}

// --packages wins over the seed file; the file is then never opened.
async fn load_seed(cli: &Cli) -> Result<Vec<PackageName>, InputError> {
    match &cli.packages {
        Some(list) => {
            let names = package::parse_seed_list(list.iter().map(String::as_str));
            if names.is_empty() {
                return Err(InputError::EmptySeed);
            }
            Ok(names)
        }
        None => package::load_seed_file(&cli.pip_list).await,
    }
}

fn print_results(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &RunReport) {
    println!("{:<30} {:>8} {:>9} {:>7}  {}", "PACKAGE", "TOTAL", "FINISHED", "FAILED", "NOTE");
    println!("{}", "=".repeat(75));

    for p in &report.packages {
        let note = match &p.status {
            PackageStatus::Completed if p.is_ok() => String::new(),
            PackageStatus::Completed => "some files failed".to_string(),
            PackageStatus::Aborted { reason } => format!("aborted: {}", reason),
        };
        println!(
            "{:<30} {:>8} {:>9} {:>7}  {}",
            p.package.as_str(),
            p.total,
            p.finished,
            p.failed,
            note
        );
    }

    println!();
    println!("Summary:");
    println!("   Packages: {} ({} aborted)", report.packages.len(), report.aborted());
    println!("   Files:    {}", report.total());
    println!("   Finished: {}", report.finished());
    println!("   Failed:   {}", report.failed());
}
