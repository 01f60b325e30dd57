//! Outbound and inbound sync between two simulated devices.
//!
//! Demonstrates:
//! - Serializing live tabs with tracking parameters stripped
//! - Building a checksummed snapshot
//! - Accepting it on a second device and restoring its tabs
//! - Rejecting a tampered copy of the same snapshot
//! - Detecting conflicts between both devices' tabs
//!
//! Usage:
//!   cargo run --example round_trip
//!   cargo run --example round_trip -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tab_sync::{
    BrowserTab, DeserializeOptions, DeviceMetadata, ResolutionStrategy, Result, SerializeOptions,
    SyncPipeline, TabCreateParams, TabSerializer, TabSink, TabSource, detect_conflicts,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Simulated Browser
// ============================================================================

struct StaticTabs(Vec<BrowserTab>);

#[async_trait]
impl TabSource for StaticTabs {
    async fn query_tabs(&self) -> Result<Vec<BrowserTab>> {
        Ok(self.0.clone())
    }
}

struct PrintingSink;

#[async_trait]
impl TabSink for PrintingSink {
    async fn create_tab(&self, params: TabCreateParams) -> Result<()> {
        println!(
            "        + {} (pinned: {}, index: {:?})",
            params.url, params.pinned, params.index
        );
        Ok(())
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|a| a == "--debug");
    init_logging(debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    println!("=== Tab Sync Round Trip ===\n");

    // ========================================================================
    // Devices
    // ========================================================================

    let laptop = device("laptop-1", "Laptop")?;
    let desktop = device("desktop-1", "Desktop")?;

    let laptop_tabs = vec![
        BrowserTab::new(11, "https://mail.example.com/inbox")
            .with_title("Inbox")
            .with_position(1, 0)
            .pinned(),
        BrowserTab::new(12, "https://news.example.com/story?id=7&utm_source=feed&fbclid=x")
            .with_title("Story")
            .with_position(1, 1),
        BrowserTab::new(13, "https://docs.example.com/guide")
            .with_title("")
            .with_position(1, 2),
    ];

    let sender = SyncPipeline::new(
        laptop.clone(),
        Arc::new(StaticTabs(laptop_tabs)),
        Arc::new(PrintingSink),
    );
    let receiver = SyncPipeline::new(
        desktop.clone(),
        Arc::new(StaticTabs(Vec::new())),
        Arc::new(PrintingSink),
    );

    // ========================================================================
    // Outbound
    // ========================================================================

    println!("[Outbound] Serializing laptop tabs...");
    let mut extra = Map::new();
    extra.insert("trigger".into(), json!("manual"));
    let outbound = sender
        .outbound(&SerializeOptions::new(), extra)
        .await
        .context("outbound sync failed")?;

    for tab in &outbound.snapshot.tabs {
        println!("        {} | {}", tab.url, tab.title);
    }
    println!(
        "        ✓ Snapshot {} with checksum {}\n",
        outbound
            .snapshot
            .sync_id()
            .map(|id| id.as_str())
            .unwrap_or("-"),
        outbound.snapshot.checksum.as_deref().unwrap_or("-")
    );

    let wire = serde_json::to_value(&outbound.snapshot)?;

    // ========================================================================
    // Inbound
    // ========================================================================

    println!("[Inbound] Restoring on desktop...");
    let inbound = receiver
        .inbound(&wire, &DeserializeOptions::new().in_window(1))
        .await
        .context("inbound sync failed")?;
    println!("        ✓ Opened {} tabs\n", inbound.created);

    println!("[Inbound] Tampered copy...");
    let mut tampered = wire.clone();
    tampered["tabs"][0]["url"] = Value::from("https://phish.example.net/");
    match receiver.inbound(&tampered, &DeserializeOptions::new()).await {
        Ok(_) => anyhow::bail!("tampered snapshot was accepted"),
        Err(e) => println!("        ✓ Rejected with {}: {e}\n", e.code()),
    }

    // ========================================================================
    // Conflicts
    // ========================================================================

    println!("[Conflicts] Comparing desktop tabs with laptop snapshot...");
    let desktop_tabs = desktop
        .serialize_tabs(
            &[
                BrowserTab::new(1, "https://mail.example.com/inbox")
                    .with_title("Inbox (3)")
                    .with_position(1, 0)
                    .pinned(),
                BrowserTab::new(2, "https://calendar.example.com/")
                    .with_title("Calendar")
                    .with_position(1, 1),
            ],
            &SerializeOptions::new(),
        )
        .await?
        .into_items();

    let conflicts = detect_conflicts(
        &desktop_tabs,
        &inbound.snapshot.tabs,
        ResolutionStrategy::Manual,
    );
    for conflict in &conflicts.conflicts {
        println!(
            "        [{}] severity {}: {}",
            conflict.kind.as_str(),
            conflict.severity,
            conflict.reason
        );
    }

    println!("\n=== Done ===");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn device(id: &str, name: &str) -> Result<TabSerializer> {
    TabSerializer::builder()
        .device(
            DeviceMetadata::new(id, name)
                .with_browser("Firefox", "128.0")
                .with_platform(std::env::consts::OS),
        )
        .build()
}

fn init_logging(debug: bool) {
    let filter = if debug { "tab_sync=debug" } else { "tab_sync=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
