// ==============================================================================
// main.rs - Manhattan Plot Generator Entry Point
// ==============================================================================
// Description: Renders and stores Manhattan plots for every test in a module
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Exit codes:
//   0 - batch finished (per-test failures are reported in the summary)
//   1 - bad arguments, connection failure, or test enumeration failure
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use mplot_generator::config::Args;
use mplot_generator::pipeline;
use mplot_generator::store::MySqlPlotStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so --json output stays clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mplot_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let run_id = Uuid::new_v4();
    let span = info_span!("mplot_run", %run_id, module_id = args.module_id);

    match run(args).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Manhattan plot generation aborted: {:#}", e);
            eprintln!("\nError: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let db_config = args.database_config();
    let settings = args.pipeline_settings();
    let renderer = args.renderer();

    if !args.json {
        println!("Starting Manhattan Plot Generation for {}", db_config.database_name());
        println!("Host: {}, User: {}", db_config.host, db_config.user);
        println!("{}", "-".repeat(50));
    }

    let mut store = MySqlPlotStore::connect(&db_config)
        .await
        .context("Failed to connect to module database")?;

    info!("Generating plots in {}", store.database());

    let result = pipeline::process_all(
        &mut store,
        &renderer,
        &settings,
        db_config.module_id,
        &args.tests,
    )
    .await;

    // Release the connection before inspecting the outcome
    store.close().await;

    let summary = result.context("Failed to process module tests")?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize batch summary")?;
        println!("{}", json);
    } else {
        println!();
        println!("{}", summary);
    }

    Ok(())
}
