use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use itemproc_core::domain::{Item, STATUS_NEW};
use itemproc_core::impls::InMemoryItemStore;
use itemproc_core::{ProcessorBuilder, ProcessorConfig, RunError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Number of demo items seeded into the in-memory store.
const SEED_ITEMS_VAR: &str = "ITEMPROC_SEED_ITEMS";
const DEFAULT_SEED_ITEMS: usize = 50;

/// How long the caller is willing to wait for one run.
const RUN_TIMEOUT: Duration = Duration::from_secs(30);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // another subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn seed_count() -> usize {
    std::env::var(SEED_ITEMS_VAR)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_SEED_ITEMS)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // (A) 設定とストアを用意
    let config = match ProcessorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let store = InMemoryItemStore::new();
    let n = seed_count();
    store
        .seed((0..n).map(|i| {
            Item::new(
                format!("Item{i}"),
                "demo item",
                STATUS_NEW,
                format!("item{i}@example.com"),
            )
        }))
        .await;
    info!(items = n, "store seeded");

    // (B) サービス（プール込み）を構築
    let service = match ProcessorBuilder::new()
        .store(Arc::new(store))
        .config(config)
        .build()
    {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "could not build item service");
            return ExitCode::FAILURE;
        }
    };

    // (C) 全件処理して結果を待つ
    let mut handle = service.process_items();
    let outcome = handle.wait_timeout(RUN_TIMEOUT).await;

    let code = match &outcome {
        Ok(result) => {
            print_json(&result.counts());
            ExitCode::SUCCESS
        }
        Err(RunError::TasksFailed(failure)) => {
            for f in failure.failures() {
                error!(item_id = %f.item_id(), error = %f, "item failed");
            }
            print_json(&failure.counts());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    };

    // (D) プールを止める（1 回だけ）
    service.shutdown().await;
    code
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => error!(error = %e, "could not serialize summary"),
    }
}
