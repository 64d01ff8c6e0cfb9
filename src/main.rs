use bsw::cli::Cli;
use bsw::error::FarmError;
use bsw::farm::client::FarmClient;
use bsw::farm::evaluate::{self, format_delta};
use bsw::farm::poller::{FarmEvent, Poller};
use bsw::model::{PlatformIndex, TargetResult};
use bsw::report;

use chrono::{Local, TimeDelta};
use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let mut args = Cli::parse();
    if args.debug {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .init();
    }
    if !args.has_action() {
        args.verbose = true;
    }

    let client = FarmClient::new(args.index_url.clone());
    let index = client.load_index().await?;
    let platform = select_platform(&index, &args);

    let needs_page = args.verbose
        || args.buildbox
        || args.cycle
        || args.evaluate.is_some()
        || args.json.is_some();
    if needs_page {
        let snapshot = client.build_infos(&index, &platform).await?;

        if args.verbose {
            print!("{}", report::render_overview(&snapshot, &platform));
        }
        if let Some(path) = &args.json {
            report::write_json(&snapshot, path)?;
            println!("File '{}' was successfully created.", path.display());
        }
        if args.buildbox {
            match evaluate::find_building_box(&snapshot) {
                Some(name) => println!("Currently the image is built for: '{name}'"),
                None => println!("At the moment no image is built on the platform!"),
            }
        }
        if let Some(boxname) = &args.evaluate {
            let result = evaluate::evaluate(&snapshot, Some(boxname));
            if result.target == TargetResult::Missing {
                let warning = FarmError::BoxNotFound(boxname.clone());
                println!("{warning}. Try another platform.");
            } else if result.next_build > TimeDelta::zero() {
                let eta = Local::now() + result.next_build;
                println!(
                    "Estimated duration for next image for '{}' in {}h at {} ({} boxes ahead)",
                    boxname,
                    format_delta(result.next_build),
                    eta.format("%Y/%m/%d, %H:%M:%S"),
                    result.boxes_ahead
                );
            } else {
                println!("Server paused, unclear how many boxes are ahead!");
            }
        }
        if args.cycle {
            let result = evaluate::evaluate(&snapshot, None);
            println!(
                "Estimated duration of a complete cycle ({}): {} h",
                platform,
                format_delta(result.cycle_time)
            );
        }
    }

    if args.supported {
        if index.architectures().is_empty() {
            println!("No architectures found");
        } else {
            println!(
                "Available architectures: {}",
                index.architectures().join(", ")
            );
        }
    }
    if args.usable {
        if index.platforms().is_empty() {
            println!("No platforms found");
        } else {
            println!("Available platforms: {}", usable_list(&index));
        }
    }

    if let Some(secs) = args.watch {
        run_watch(client, &index, &platform, secs).await?;
    }
    Ok(())
}

/// Picks the platform from `-p` or resolves it from `-a`, exiting with the
/// supported list on an unknown name.
fn select_platform(index: &PlatformIndex, args: &Cli) -> String {
    if let Some(arg) = &args.platform {
        match index.find_platform(arg) {
            Some(name) => return name.to_string(),
            None => {
                eprintln!(
                    "Unknown platform '{}'. Supported is: {}",
                    arg.to_lowercase(),
                    usable_list(index)
                );
                std::process::exit(1);
            }
        }
    }
    if let Some(name) = index.resolve(&args.architecture) {
        return name.to_string();
    }
    eprintln!(
        "Unknown architecture '{}'. Supported is: {}",
        args.architecture,
        index.architectures().join(", ")
    );
    std::process::exit(1);
}

fn usable_list(index: &PlatformIndex) -> String {
    index
        .platforms()
        .iter()
        .map(|p| p.replace(' ', "_").to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Re-renders the overview on every snapshot the background poller
/// delivers, until the process is interrupted.
async fn run_watch(
    client: FarmClient,
    index: &PlatformIndex,
    platform: &str,
    secs: u64,
) -> Result<()> {
    let url = index
        .url_for(platform)
        .ok_or_else(|| eyre!("unknown platform '{platform}'"))?
        .to_string();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_interval_tx, interval_rx) = watch::channel(secs.max(1));
    let poller = Poller::new(client, url, tx, interval_rx);
    tokio::spawn(poller.run());

    while let Some(event) = rx.recv().await {
        match event {
            FarmEvent::Snapshot(snapshot) => {
                print!("{}", report::render_overview(&snapshot, platform));
            }
            FarmEvent::Error(msg) => eprintln!("Error: {msg}"),
        }
    }
    Ok(())
}
