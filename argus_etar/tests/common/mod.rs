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

#![allow(unused)]

//! test data generators shared by the integration tests

use std::sync::Mutex;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use argus_etar::{FlightState, errors::{Result, ArgusError}, notifier::{EtarAlert, Notifier}};

pub fn t0 ()->DateTime<Utc> { Utc.with_ymd_and_hms( 2025, 7, 22, 12, 0, 0).unwrap() }

/// `t0` shifted by `secs` seconds
pub fn at (secs: i64)->DateTime<Utc> { t0() + TimeDelta::seconds(secs) }

//--- SBS records (22 fields)

pub fn identity (icao24: &str, callsign: &str)->String {
    format!("MSG,1,111,11111,{icao24},111111,2025/07/22,12:00:00.000,2025/07/22,12:00:00.000,{callsign},,,,,,,,,,,0")
}

pub fn position (icao24: &str, altitude: i64, lat: f64, lon: f64)->String {
    format!("MSG,3,111,11111,{icao24},111111,2025/07/22,12:00:00.000,2025/07/22,12:00:00.000,,{altitude},,,{lat},{lon},,,,,,0")
}

pub fn velocity (icao24: &str, ground_speed: i64, vertical_rate: i64)->String {
    format!("MSG,4,111,11111,{icao24},111111,2025/07/22,12:00:00.000,2025/07/22,12:00:00.000,,,{ground_speed},0,,,{vertical_rate},,,,,0")
}

/// a flight that satisfies the default approach criteria
pub fn approaching_flight (time: DateTime<Utc>)->FlightState {
    let mut fs = FlightState::new( time);
    fs.callsign = Some("ABC123".to_string());
    fs.altitude = Some(2000);
    fs.vertical_rate = Some(-500);
    fs.ground_speed = Some(200);
    fs.message_count = 22;
    fs
}

//--- notifiers

#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<EtarAlert>>
}

impl RecordingNotifier {
    pub fn count (&self)->usize { self.alerts.lock().unwrap().len() }
    pub fn messages (&self)->Vec<String> { self.alerts.lock().unwrap().iter().map( |a| a.message()).collect() }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name (&self)->&str { "recording" }

    async fn notify (&self, alert: &EtarAlert)->Result<()> {
        self.alerts.lock().unwrap().push( alert.clone());
        Ok(())
    }
}

pub struct FailingNotifier {}

#[async_trait]
impl Notifier for FailingNotifier {
    fn name (&self)->&str { "failing" }

    async fn notify (&self, alert: &EtarAlert)->Result<()> {
        Err( ArgusError::NotifyError( format!("cannot deliver alert for {}", alert.icao24)) )
    }
}
