// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Host cache daemon entry point.
//!
//! Starts the cache event loops and the periodic expired-hold sweeper,
//! then runs until interrupted. Backend plugins are wired in by the
//! surrounding process bootstrap; standalone the daemon runs with the
//! no-op plugin.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use hostmgr_cache::host_cache::HostCache;
use hostmgr_cache::plugin::{event_channels, NoopPlugin};
use hostmgr_common::config::HostCacheConfig;
use hostmgr_util::time::{Clock, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "hostmgrd", about = "Host cache daemon")]
struct Args {
    /// Path to a JSON config file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Base64-encoded JSON config (as passed by launchers)
    #[arg(long)]
    config_b64: Option<String>,

    /// Log directory
    #[arg(long)]
    log_dir: Option<std::path::PathBuf>,

    /// Verbosity (0 = info, 1 = debug, 2+ = trace)
    #[arg(short, long, default_value_t = 0)]
    verbose: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    hostmgr_util::logging::init_logging("hostmgrd", args.log_dir.as_deref(), args.verbose);

    let config = match (&args.config, &args.config_b64) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(path)?;
            HostCacheConfig::from_json(&json).map_err(|e| anyhow::anyhow!(e))?
        }
        (None, Some(encoded)) => {
            HostCacheConfig::from_base64_json(encoded).map_err(|e| anyhow::anyhow!(e))?
        }
        (None, None) => HostCacheConfig::default(),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ((_host_tx, host_rx), (_pod_tx, pod_rx)) = event_channels();
    let cache = Arc::new(HostCache::new(
        config.clone(),
        clock.clone(),
        host_rx,
        pod_rx,
        Arc::new(NoopPlugin),
    ));
    cache.start();

    let mut sweep = tokio::time::interval(Duration::from_millis(config.hold_sweep_interval_ms));
    loop {
        tokio::select! {
            _ = sweep.tick() => {
                let freed = cache.reset_expired_held_host_summaries(clock.now_ms());
                if !freed.is_empty() {
                    tracing::info!(hosts = ?freed, "reset expired held hosts");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("hostmgrd shutting down");
    cache.stop().await;
    Ok(())
}
