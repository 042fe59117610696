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

//! the evaluation side: periodically sweep the [`FlightStore`], classify the surviving flights and
//! dispatch notifications for new approaches

use std::{sync::{Arc, atomic::{AtomicU64, Ordering}}, time::Duration};
use chrono::{DateTime,Utc};
use tokio::{self, task::JoinSet, time::{interval, timeout, MissedTickBehavior}};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, error};
use argus_common::datetime::utc_now;

use crate::{
    FlightStore, FlightTable, classifier::EtarCriteria, config::EtarConfig,
    errors::{Result, ArgusError}, ingest::IngestStats, notifier::{EtarAlert, Notifier}
};

/// counters of the evaluation task. Notification outcomes are updated asynchronously by dispatch tasks
#[derive(Debug,Default)]
pub struct EvalStats {
    cycles: AtomicU64,
    evicted: AtomicU64,
    notified: AtomicU64, // successfully delivered notifications
    notify_failures: AtomicU64,
}

impl EvalStats {
    pub fn cycles (&self)->u64 { self.cycles.load(Ordering::Relaxed) }
    pub fn evicted (&self)->u64 { self.evicted.load(Ordering::Relaxed) }
    pub fn notified (&self)->u64 { self.notified.load(Ordering::Relaxed) }
    pub fn notify_failures (&self)->u64 { self.notify_failures.load(Ordering::Relaxed) }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum SchedulerState {
    Idle, // waiting for the next tick - the only state in which we react to cancellation
    Evaluating,
}

/// what happened in one evaluation cycle
#[derive(Debug,Default,Clone,PartialEq)]
pub struct CycleReport {
    pub evaluated: usize, // number of flights that survived the sweep
    pub evicted: Vec<String>,
    pub alerted: Vec<String>, // flights for which we dispatched a notification
}

pub struct EvaluationScheduler {
    store: Arc<FlightStore>,
    notifier: Arc<dyn Notifier>,
    criteria: EtarCriteria,

    eval_interval: Duration,
    stale_after: Duration,
    notify_timeout: Duration,
    print_flights: bool,

    state: SchedulerState,
    stats: Arc<EvalStats>,
    ingest_stats: Option<Arc<IngestStats>>, // only reported
    dispatches: JoinSet<()>, // pending notification tasks
}

impl EvaluationScheduler {
    pub fn new (config: &EtarConfig, store: Arc<FlightStore>, notifier: Arc<dyn Notifier>)->Self {
        EvaluationScheduler {
            store,
            notifier,
            criteria: config.criteria,
            eval_interval: config.eval_interval,
            stale_after: config.stale_after,
            notify_timeout: config.notify_timeout,
            print_flights: config.print_flights,
            state: SchedulerState::Idle,
            stats: Arc::new( EvalStats::default()),
            ingest_stats: None,
            dispatches: JoinSet::new(),
        }
    }

    /// report ingestion counters along with our own on each cycle
    pub fn with_ingest_stats (mut self, ingest_stats: Arc<IngestStats>)->Self {
        self.ingest_stats = Some(ingest_stats);
        self
    }

    pub fn state (&self)->SchedulerState { self.state }

    pub fn stats (&self)->Arc<EvalStats> { self.stats.clone() }

    /// run evaluation cycles every `eval_interval` until cancelled. The first cycle happens one interval after
    /// start. Cancellation is only checked while idle - a cycle that has started always completes. Before we
    /// return we wait for pending notifications (each bounded by `notify_timeout`)
    pub async fn run (mut self, cancel: CancellationToken) {
        let mut timer = interval( self.eval_interval);
        timer.set_missed_tick_behavior( MissedTickBehavior::Delay);
        timer.tick().await; // the first tick completes immediately

        info!("evaluating flights every {:?}", self.eval_interval);
        loop {
            self.state = SchedulerState::Idle;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            self.state = SchedulerState::Evaluating;
            self.evaluate( utc_now());
        }

        self.state = SchedulerState::Idle;
        self.flush().await;
        info!("evaluation terminated after {} cycles", self.stats.cycles());
    }

    /// one evaluation cycle: sweep the store, classify survivors and dispatch notifications for flights that are
    /// approaching and have not been notified yet. Has to be called from within a tokio runtime
    pub fn evaluate (&mut self, now: DateTime<Utc>)->CycleReport {
        let sweep = self.store.sweep( now, self.stale_after);
        self.stats.cycles.fetch_add( 1, Ordering::Relaxed);
        self.stats.evicted.fetch_add( sweep.evicted.len() as u64, Ordering::Relaxed);

        for icao24 in &sweep.evicted {
            info!("not seen for {:?}, dropping {}", self.stale_after, icao24);
        }
        if self.print_flights {
            info!("current flights:\n{}", FlightTable( &sweep.evaluated));
        }

        let mut alerted: Vec<String> = Vec::new();
        for (icao24, flight) in &sweep.evaluated {
            if flight.notified || !self.criteria.is_approaching( flight) { continue }

            // mark before dispatch - a failed notification is not retried
            if self.store.mark_notified( icao24) {
                self.dispatch( EtarAlert::new( icao24, flight, now));
                alerted.push( icao24.clone());
            }
        }

        self.reap();
        self.log_stats( sweep.evaluated.len());

        CycleReport { evaluated: sweep.evaluated.len(), evicted: sweep.evicted, alerted }
    }

    fn dispatch (&mut self, alert: EtarAlert) {
        let notifier = self.notifier.clone();
        let stats = self.stats.clone();
        let max_wait = self.notify_timeout;

        self.dispatches.spawn( async move {
            let res: Result<()> = match timeout( max_wait, notifier.notify( &alert)).await {
                Ok(res) => res,
                Err(_) => Err( ArgusError::OpFailedError( format!("no response within {:?}", max_wait)) )
            };

            match res {
                Ok(()) => {
                    stats.notified.fetch_add( 1, Ordering::Relaxed);
                    debug!("{} notification sent for {}", notifier.name(), alert.icao24);
                }
                Err(e) => {
                    stats.notify_failures.fetch_add( 1, Ordering::Relaxed);
                    error!("{} notification for {} failed: {}", notifier.name(), alert.icao24, e);
                }
            }
        });
    }

    /// collect finished notification tasks without waiting
    fn reap (&mut self) {
        while let Some(res) = self.dispatches.try_join_next() {
            if let Err(e) = res { error!("notification task failed: {}", e) }
        }
    }

    /// wait for all pending notification tasks
    pub async fn flush (&mut self) {
        while let Some(res) = self.dispatches.join_next().await {
            if let Err(e) = res { error!("notification task failed: {}", e) }
        }
    }

    fn log_stats (&self, n_flights: usize) {
        if let Some(ingest) = &self.ingest_stats {
            info!("tracking {} flights, records: {} accepted, {} ignored, {} malformed, notifications: {} sent, {} failed",
                n_flights, ingest.accepted(), ingest.ignored(), ingest.malformed(), self.stats.notified(), self.stats.notify_failures());
        } else {
            info!("tracking {} flights, notifications: {} sent, {} failed", n_flights, self.stats.notified(), self.stats.notify_failures());
        }
    }
}
