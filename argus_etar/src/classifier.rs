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

//! the ETAR ("entering terminal approach") predicate

use serde::{Serialize,Deserialize};
use crate::FlightState;

/// thresholds for the approach classification. An aircraft is approaching if it is below `max_altitude`
/// (but airborne), has sent more than `min_messages` reports and has a vertical rate below `max_vertical_rate`
#[derive(Deserialize,Serialize,Debug,Clone,Copy,PartialEq)]
#[serde(default)]
pub struct EtarCriteria {
    pub max_altitude: i64, // ft
    pub min_messages: u64,
    pub max_vertical_rate: i64, // ft/min
}

impl Default for EtarCriteria {
    fn default()->Self {
        EtarCriteria { max_altitude: 3000, min_messages: 10, max_vertical_rate: 0 }
    }
}

impl EtarCriteria {
    /// note that altitude and vertical rate have to be observed at least once - unknown is not zero
    pub fn is_approaching (&self, flight: &FlightState)->bool {
        match (flight.altitude, flight.vertical_rate) {
            (Some(alt), Some(vr)) => {
                alt > 0 && alt < self.max_altitude
                    && flight.message_count > self.min_messages
                    && vr < self.max_vertical_rate
            }
            _ => false
        }
    }
}

/// classify with the default criteria: `0 < altitude < 3000 && message_count > 10 && vertical_rate < 0`
pub fn is_approaching (flight: &FlightState)->bool {
    EtarCriteria::default().is_approaching( flight)
}
