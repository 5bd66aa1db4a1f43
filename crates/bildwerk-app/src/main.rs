// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk — turn a batch of images into one PDF, one image per page.
//
// Entry point. Initialises logging, resolves settings, queues the files
// named on the command line and runs a single conversion.

mod cli;
mod services;

use std::process::ExitCode;
use std::sync::Arc;

use bildwerk_batch::{ChannelObserver, ProgressBus, TracingObserver};
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::human_errors::humanize_error;
use clap::Parser;
use tracing::{error, info};

use cli::Cli;
use services::data_dir;
use services::report::{print_event, print_human};
use services::session::{Session, select_bridge};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(files = cli.files.len(), "Bildwerk starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "conversion aborted");
            print_human(&humanize_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings_path = cli.config.clone().unwrap_or_else(data_dir::settings_path);
    let mut config = bildwerk_core::AppConfig::load_or_default(&settings_path)?;
    cli.apply_to(&mut config);
    config.validate()?;
    if cli.save_config {
        config.save(&settings_path)?;
    }

    let bridge = select_bridge(&config, cli.mobile);
    info!(platform = bridge.platform_name(), "platform selected");
    let mut session = Session::new(config, bridge);

    let outcome = session.add_files(&cli.files)?;
    println!("{} image(s) queued", session.store().len());
    for name in &outcome.duplicates {
        println!("{name} is already in the list, skipped");
    }
    for rotate in &cli.rotate {
        session.apply_rotation(&rotate.name, rotate.degrees)?;
    }
    if !cli.order.is_empty() {
        session.apply_order(&cli.order)?;
    }
    flush_notices(&mut session);

    let (channel, mut events) = ChannelObserver::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });
    let bus = ProgressBus::new()
        .with(Arc::new(TracingObserver))
        .with(Arc::new(channel));

    let result = session.convert(bus).await;
    printer
        .await
        .map_err(|e| BildwerkError::Io(std::io::Error::other(e.to_string())))?;
    flush_notices(&mut session);

    let delivered = result?;
    println!(
        "Saved {} page(s) to {}",
        delivered.report.page_count,
        delivered.path.display()
    );
    Ok(())
}

fn flush_notices(session: &mut Session) {
    for notice in session.take_notices() {
        print_human(&notice);
    }
}
