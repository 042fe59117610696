/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use std::sync::Arc;
use tokio::{self, signal};
use tokio_util::sync::CancellationToken;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;
use anyhow::Result;
use argus_common::{define_cli, check_cli};
use argus_etar::{FlightStore, config::{EtarConfig, load_config}, ingest::SbsIngestor, scheduler::EvaluationScheduler};

define_cli! { ARGS [about="detect aircraft entering terminal approach from an SBS feed"] =
    config: Option<String> [help="pathname of RON config file (defaults are used if not set)", long, short],
    feed: Option<String> [help="host:port of SBS feed (overrides config)", long]
}

#[tokio::main]
async fn main()->Result<()> {
    check_cli!(ARGS);

    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info"))) // use RUST_LOG to set level
        .init();

    let mut config = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => EtarConfig::default()
    };
    if let Some(feed) = &ARGS.feed {
        config.feed.addr = feed.clone();
    }
    config.validate()?;

    let notifier = config.notifier.build()?; // fail early if credentials are missing
    let store = Arc::new( FlightStore::new());
    let cancel = CancellationToken::new();

    let ingestor = SbsIngestor::new( config.feed.clone(), store.clone());
    let scheduler = EvaluationScheduler::new( &config, store.clone(), notifier).with_ingest_stats( ingestor.stats());

    let mut ingest_task = tokio::spawn( {
        let cancel = cancel.clone();
        async move { ingestor.run( cancel).await }
    });
    let eval_task = tokio::spawn( scheduler.run( cancel.clone()));

    // we run until we get interrupted or lose the feed
    let ingest_result = tokio::select! {
        _ = signal::ctrl_c() => {
            info!("shutting down");
            cancel.cancel();
            ingest_task.await
        }
        res = &mut ingest_task => {
            cancel.cancel();
            res
        }
    };

    if let Err(e) = eval_task.await {
        error!("evaluation task failed: {}", e);
    }

    ingest_result??;
    Ok(())
}
