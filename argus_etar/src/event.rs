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

use std::fmt;

use crate::FlightState;

/// a decoded report for a single aircraft, as produced by the SBS decoder
#[derive(Debug,Clone,PartialEq)]
pub struct FlightUpdate<'a> {
    pub icao24: &'a str, // the hex ident of the transponder, used verbatim as store key
    pub event: FlightEvent<'a>,
}

impl<'a> fmt::Display for FlightUpdate<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "FlightUpdate( icao24: {}, event: {})", self.icao24, self.event)
    }
}

/// the payload of accepted reports. Each variant only carries the fields it updates
#[derive(Debug,Clone,PartialEq)]
pub enum FlightEvent<'a> {
    Identity{ callsign: &'a str },
    Position{ altitude: i64, latitude: f64, longitude: f64 },
    Velocity{ ground_speed: i64, vertical_rate: i64 },
}

impl<'a> FlightEvent<'a> {

    /// set the fields carried by this event. Everything else (including timestamps and counters,
    /// which are maintained by the store) is left untouched
    pub fn apply (&self, flight: &mut FlightState) {
        match self {
            FlightEvent::Identity {callsign} => {
                let cs = callsign.trim();
                if !cs.is_empty() { flight.callsign = Some(cs.to_string()) } // empty idents don't erase what we know
            }
            FlightEvent::Position {altitude,latitude,longitude} => {
                flight.altitude = Some(*altitude);
                flight.latitude = Some(*latitude);
                flight.longitude = Some(*longitude);
            }
            FlightEvent::Velocity {ground_speed,vertical_rate} => {
                flight.ground_speed = Some(*ground_speed);
                flight.vertical_rate = Some(*vertical_rate);
            }
        }
    }

    pub fn kind (&self)->&'static str {
        match self {
            FlightEvent::Identity{..} => "identity",
            FlightEvent::Position{..} => "position",
            FlightEvent::Velocity{..} => "velocity",
        }
    }
}

impl<'a> fmt::Display for FlightEvent<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightEvent::Identity {callsign} => { write!( f, "Identity( callsign: \"{}\" )", callsign) }
            FlightEvent::Position {altitude,latitude,longitude} => { write!( f, "Position( altitude: {}, latitude: {}, longitude: {} )", altitude, latitude, longitude) }
            FlightEvent::Velocity {ground_speed,vertical_rate} => { write!( f, "Velocity( ground_speed: {}, vertical_rate: {} )", ground_speed, vertical_rate) }
        }
    }
}
