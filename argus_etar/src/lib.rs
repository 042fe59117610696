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

//! ARGUS ETAR - detect aircraft that are "entering terminal approach" from an SBS (BaseStation) feed.
//!
//! The [`FlightStore`] is the only shared mutable state. It is written by the [`ingest::SbsIngestor`]
//! task for every accepted report and swept by the [`scheduler::EvaluationScheduler`] task on each
//! evaluation tick, which classifies the surviving flights and notifies about new approaches.

use std::{fmt, time::Duration};
use chrono::{DateTime,Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use argus_common::datetime::{duration_since, short_utc_datetime_string};

pub mod errors;
pub mod event;
use event::FlightEvent;

pub mod sbs;
pub mod classifier;
pub mod notifier;
pub mod scheduler;
pub mod ingest;
pub mod config;

/// the aggregated state of one tracked aircraft
#[derive(Debug,Clone,PartialEq)]
pub struct FlightState {
    pub callsign: Option<String>,
    pub altitude: Option<i64>, // ft
    pub ground_speed: Option<i64>, // kn
    pub vertical_rate: Option<i64>, // ft/min, negative means descending
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    pub message_count: u64, // reports received after the one that created this entry
    pub idle_ticks: u64, // evaluation cycles since the last report
    pub notified: bool, // once set this is never reset for the lifetime of the entry
}

impl FlightState {
    pub fn new (time: DateTime<Utc>)->Self {
        FlightState {
            callsign: None,
            altitude: None,
            ground_speed: None,
            vertical_rate: None,
            latitude: None,
            longitude: None,
            first_seen: time,
            last_seen: time,
            message_count: 0,
            idle_ticks: 0,
            notified: false,
        }
    }

    pub fn is_stale (&self, now: &DateTime<Utc>, stale_after: Duration)->bool {
        duration_since( now, &self.last_seen) > stale_after
    }

    /// record a report that was received for an already existing entry
    fn touch (&mut self, time: DateTime<Utc>) {
        if time > self.last_seen { self.last_seen = time } // never move back behind first_seen
        self.message_count += 1;
        self.idle_ticks = 0;
    }
}

impl fmt::Display for FlightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "FlightState(")?;
        if let Some(cs) = &self.callsign { write!( f, " cs: \"{cs}\",")?; }
        if let Some(alt) = self.altitude { write!( f, " alt: {alt},")?; }
        if let (Some(lat),Some(lon)) = (self.latitude,self.longitude) { write!( f, " pos: ({lat:.5},{lon:.5}),")?; }
        if let Some(gs) = self.ground_speed { write!( f, " spd: {gs},")?; }
        if let Some(vr) = self.vertical_rate { write!( f, " vr: {vr},")?; }
        write!( f, " msgs: {}, ticks: {}, last: {}", self.message_count, self.idle_ticks, short_utc_datetime_string(&self.last_seen))?;
        if self.notified { write!( f, ", notified")?; }
        write!( f, " )")
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum MergeResult { Created, Updated }

/// the outcome of a [`FlightStore::sweep`]
#[derive(Debug,Default)]
pub struct Sweep {
    pub evaluated: Vec<(String,FlightState)>, // snapshots of the surviving entries, sorted by icao24
    pub evicted: Vec<String>, // icao24 of entries that were removed because they went stale
}

/// the authoritative map from transponder hex ident to aggregated flight state.
///
/// This is shared between the ingestion task (merge) and the evaluation task (sweep, mark_notified).
/// The map is sharded - each operation on an entry holds the write lock of the shard that contains it,
/// i.e. concurrent merges for the same icao24 serialize while merges for other shards proceed. Since
/// sweep visits one shard at a time under its write lock, an entry is always observed either before or
/// after a concurrent merge, never in between.
pub struct FlightStore {
    flights: DashMap<String,FlightState>,
}

impl FlightStore {
    pub fn new ()->Self {
        FlightStore { flights: DashMap::new() }
    }

    /// apply a decoded report to the entry for `icao24`, creating it if this is the first report.
    /// The creating report does not count towards `message_count`
    pub fn merge (&self, icao24: &str, event: &FlightEvent, time: DateTime<Utc>)->MergeResult {
        // fast path avoids allocating a key for known aircraft
        if let Some(mut flight) = self.flights.get_mut( icao24) {
            flight.touch( time);
            event.apply( &mut flight);
            return MergeResult::Updated
        }

        // somebody else might have created the entry since we looked, hence we have to go through the entry API
        match self.flights.entry( icao24.to_string()) {
            Entry::Occupied(mut e) => {
                let flight = e.get_mut();
                flight.touch( time);
                event.apply( flight);
                MergeResult::Updated
            }
            Entry::Vacant(e) => {
                let mut flight = FlightState::new( time);
                event.apply( &mut flight);
                e.insert( flight);
                MergeResult::Created
            }
        }
    }

    /// age all entries by one tick and remove the ones that have not been updated for more than `stale_after`.
    /// Returns snapshots of the surviving entries and the ids of the removed ones
    pub fn sweep (&self, now: DateTime<Utc>, stale_after: Duration)->Sweep {
        let mut sweep = Sweep::default();

        self.flights.retain( |icao24, flight| {
            flight.idle_ticks += 1;
            if flight.is_stale( &now, stale_after) {
                sweep.evicted.push( icao24.clone());
                false
            } else {
                sweep.evaluated.push( (icao24.clone(), flight.clone()));
                true
            }
        });

        sweep.evaluated.sort_by( |a,b| a.0.cmp(&b.0));
        sweep.evicted.sort();
        sweep
    }

    /// set the `notified` flag of the entry for `icao24`. Returns true if the flag was changed by this call,
    /// false if it was already set or there is no such entry
    pub fn mark_notified (&self, icao24: &str)->bool {
        if let Some(mut flight) = self.flights.get_mut( icao24) {
            if !flight.notified {
                flight.notified = true;
                return true
            }
        }
        false
    }

    pub fn get (&self, icao24: &str)->Option<FlightState> {
        self.flights.get( icao24).map( |e| e.value().clone())
    }

    pub fn contains (&self, icao24: &str)->bool { self.flights.contains_key( icao24) }

    pub fn len (&self)->usize { self.flights.len() }

    pub fn is_empty (&self)->bool { self.flights.is_empty() }

    /// a copy of all entries, sorted by icao24. Note this is not a point-in-time snapshot of the whole
    /// store - each entry is consistent but concurrent merges can happen while we iterate
    pub fn snapshot (&self)->Vec<(String,FlightState)> {
        let mut list: Vec<(String,FlightState)> = self.flights.iter().map( |e| (e.key().clone(), e.value().clone())).collect();
        list.sort_by( |a,b| a.0.cmp(&b.0));
        list
    }
}

impl Default for FlightStore {
    fn default()->Self { FlightStore::new() }
}

/// a right aligned, tabular rendering of flight entries (one line per aircraft)
pub struct FlightTable<'a> (pub &'a [(String,FlightState)]);

impl<'a> fmt::Display for FlightTable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!( f, "{:>8} {:>8} {:>7} {:>10} {:>11} {:>5} {:>6} {:>6} {:>5} {:>4}",
                  "ID", "CS", "Alt", "Lat", "Lon", "GS", "VV", "Msg", "tick", "ntf")?;

        for (icao24, fs) in self.0 {
            writeln!( f, "{:>8} {:>8} {:>7} {:>10} {:>11} {:>5} {:>6} {:>6} {:>5} {:>4}",
                icao24,
                fs.callsign.as_deref().unwrap_or("-"),
                opt_str( &fs.altitude),
                fs.latitude.map( |v| format!("{v:.5}")).unwrap_or_else( || "-".to_string()),
                fs.longitude.map( |v| format!("{v:.5}")).unwrap_or_else( || "-".to_string()),
                opt_str( &fs.ground_speed),
                opt_str( &fs.vertical_rate),
                fs.message_count,
                fs.idle_ticks,
                if fs.notified { "*" } else { "" }
            )?;
        }
        Ok(())
    }
}

fn opt_str<T: fmt::Display> (v: &Option<T>)->String {
    match v {
        Some(v) => v.to_string(),
        None => "-".to_string()
    }
}
