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

//! the ingestion side: read SBS records from a socket, decode them and merge them into the [`FlightStore`]

use std::{str, sync::{Arc, atomic::{AtomicU64, Ordering}}};
use chrono::{DateTime,Utc};
use tokio::{self, net::TcpStream, io::{AsyncBufRead, AsyncBufReadExt, BufReader}, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, error};
use argus_common::datetime::utc_now;

use crate::{FlightStore, MergeResult, config::FeedConfig, errors::{Result, ArgusError}, sbs::{self, SbsRecord}};

/// diagnostic counters of the ingestion task
#[derive(Debug,Default)]
pub struct IngestStats {
    lines: AtomicU64,
    accepted: AtomicU64, // merged into the store
    created: AtomicU64, // subset of accepted that created new store entries
    ignored: AtomicU64, // well formed but not processed (non-MSG records, other transmission types, blank lines)
    malformed: AtomicU64, // rejected by the decoder
    connects: AtomicU64,
}

impl IngestStats {
    pub fn lines (&self)->u64 { self.lines.load(Ordering::Relaxed) }
    pub fn accepted (&self)->u64 { self.accepted.load(Ordering::Relaxed) }
    pub fn created (&self)->u64 { self.created.load(Ordering::Relaxed) }
    pub fn ignored (&self)->u64 { self.ignored.load(Ordering::Relaxed) }
    pub fn malformed (&self)->u64 { self.malformed.load(Ordering::Relaxed) }
    pub fn connects (&self)->u64 { self.connects.load(Ordering::Relaxed) }
}

/// reads SBS records from the configured socket and merges the accepted ones into the store.
/// There is only one feed connection at a time, records are processed in arrival order
pub struct SbsIngestor {
    config: FeedConfig,
    store: Arc<FlightStore>,
    stats: Arc<IngestStats>,
}

impl SbsIngestor {
    pub fn new (config: FeedConfig, store: Arc<FlightStore>)->Self {
        SbsIngestor { config, store, stats: Arc::new( IngestStats::default()) }
    }

    pub fn stats (&self)->Arc<IngestStats> { self.stats.clone() }

    /// process the feed until we get cancelled, in which case we return `Ok(())`. If the connection fails
    /// or gets closed we try to reconnect up to `reconnect_attempts` times (the budget is restored once a
    /// connection delivered data) before returning the error
    pub async fn run (&self, cancel: CancellationToken)->Result<()> {
        let mut attempts_left = self.config.reconnect_attempts;

        loop {
            let lines_before = self.stats.lines();

            match self.run_connection( &cancel).await {
                Ok(()) => return Ok(()), // cancelled
                Err(e) => {
                    if self.stats.lines() > lines_before {
                        attempts_left = self.config.reconnect_attempts;
                    }
                    if attempts_left == 0 {
                        error!("giving up on SBS feed {}: {}", self.config.addr, e);
                        return Err(e)
                    }
                    attempts_left -= 1;
                    warn!("SBS feed {} failed: {}, reconnecting in {:?}", self.config.addr, e, self.config.reconnect_delay);

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Ok(()),
                        _ = sleep( self.config.reconnect_delay) => {}
                    }
                }
            }
        }
    }

    /// one connection lifetime. The stream is dropped on every exit path
    async fn run_connection (&self, cancel: &CancellationToken)->Result<()> {
        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            res = TcpStream::connect( self.config.addr.as_str()) => res?
        };
        self.stats.connects.fetch_add( 1, Ordering::Relaxed);
        info!("collecting flight data from SBS feed {}", self.config.addr);

        let reader = BufReader::with_capacity( 8192, stream);
        self.process_lines( reader, cancel).await
    }

    /// process newline separated records until the reader is exhausted (which is reported as
    /// [`ArgusError::FeedClosed`]) or we get cancelled (which returns `Ok(())`)
    pub async fn process_lines<R> (&self, mut reader: R, cancel: &CancellationToken)->Result<()> where R: AsyncBufRead + Unpin {
        let mut buf: Vec<u8> = Vec::with_capacity(256);

        loop {
            buf.clear();
            let len = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                res = reader.read_until( b'\n', &mut buf) => res?
            };
            if len == 0 {
                return Err( ArgusError::FeedClosed( format!("end of SBS stream {}", self.config.addr)) )
            }

            match str::from_utf8( &buf) {
                Ok(line) => { self.process_line( line, utc_now()); }
                Err(_) => {
                    self.stats.lines.fetch_add( 1, Ordering::Relaxed);
                    self.stats.malformed.fetch_add( 1, Ordering::Relaxed);
                    debug!("dropped non UTF-8 SBS record");
                }
            }
        }
    }

    /// decode a single record and merge it into the store if it was accepted. Malformed records are counted
    /// and dropped. Returns the merge result for accepted records
    pub fn process_line (&self, line: &str, time: DateTime<Utc>)->Option<MergeResult> {
        self.stats.lines.fetch_add( 1, Ordering::Relaxed);

        if line.trim().is_empty() {
            self.stats.ignored.fetch_add( 1, Ordering::Relaxed);
            return None
        }

        match sbs::decode_line( line) {
            Ok(SbsRecord::Accepted(update)) => {
                let res = self.store.merge( update.icao24, &update.event, time);
                self.stats.accepted.fetch_add( 1, Ordering::Relaxed);
                if res == MergeResult::Created {
                    self.stats.created.fetch_add( 1, Ordering::Relaxed);
                    debug!("new flight {} from {} report", update.icao24, update.event.kind());
                }
                Some(res)
            }
            Ok(SbsRecord::Ignored) => {
                self.stats.ignored.fetch_add( 1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                self.stats.malformed.fetch_add( 1, Ordering::Relaxed);
                debug!("dropped SBS record: {}", e);
                None
            }
        }
    }
}
