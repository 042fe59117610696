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

use argus_common::{extract_fields, csv::CsvRecord};
use crate::errors::{Result, ArgusError, parse_error};
use crate::event::{FlightUpdate, FlightEvent};

/// number of fields in a valid SBS record
pub const SBS_FIELD_COUNT: usize = 22;

/// the outcome of decoding a single SBS line
#[derive(Debug,Clone,PartialEq)]
pub enum SbsRecord<'a> {
    Accepted( FlightUpdate<'a>),
    Ignored, // well formed but not a record type we process
}

/// SBS as documented on http://woodair.net/SBS/Article/Barebones42_Socket_Data.htm
///
/// Message examples:
///  MSG,1,111,11111,AA2BC2,111111,2016/03/11,13:07:16.663,2016/03/11,13:07:16.626,UAL814  ,,,,,,,,,,,0
///  MSG,3,111,11111,A04424,111111,2016/03/11,13:07:05.343,2016/03/11,13:07:05.288,,11025,,,37.17274,-122.03935,,,,,,0
///  MSG,4,111,11111,AC1FCC,111111,2016/03/11,13:07:07.777,2016/03/11,13:07:07.713,,,316,106,,,1536,,,,,0
///
/// fields (0-based):
///   0: message type (MSG, SEL, ID, AIR, STA, CLK) - we only process MSG
///   1: transmission type (1: ES identification, 3: ES airborne position, 4: ES airborne velocity)
///   4: ICAO 24 bit id (mode S transponder code)
///  10: callsign
///  11: mode-C altitude [ft]
///  12: ground speed [kn]
///  14: latitude
///  15: longitude
///  16: vertical rate [ft/min]
///
/// Records that do not have exactly [`SBS_FIELD_COUNT`] fields, lack an ICAO id or contain values that do
/// not parse for a processed transmission type are rejected as a whole, i.e. we never return partial
/// updates. Other message and transmission types are `Ignored`.
pub fn decode_line<'a> (line: &'a str)->Result<SbsRecord<'a>> {
    let rec = CsvRecord::new( line);
    if rec.len() != SBS_FIELD_COUNT {
        return Err( parse_error!( "invalid SBS field count {}: {}", rec.len(), rec.line()) )
    }

    if rec.str_field(0) != Some("MSG") {
        return Ok( SbsRecord::Ignored )
    }

    let icao24 = match rec.str_field(4) {
        Some(id) if !id.is_empty() => id,
        _ => return Err( parse_error!( "missing ICAO id in SBS message: {}", rec.line()) )
    };

    match rec.str_field(1) {
        Some("1") => decode_identification( &rec, icao24),
        Some("3") => decode_airborne_position( &rec, icao24),
        Some("4") => decode_airborne_velocity( &rec, icao24),
        _ => Ok( SbsRecord::Ignored )
    }
}

fn decode_identification<'a> (rec: &CsvRecord<'a>, icao24: &'a str)->Result<SbsRecord<'a>> {
    if let Some(cs) = rec.str_field(10) {
        let event = FlightEvent::Identity{ callsign: cs.trim() };
        Ok( SbsRecord::Accepted( FlightUpdate{ icao24, event }) )
    } else {
        Err( parse_error!( "missing callsign in identification message: {}", rec.line()) )
    }
}

fn decode_airborne_position<'a> (rec: &CsvRecord<'a>, icao24: &'a str)->Result<SbsRecord<'a>> {
    extract_fields! { rec ?
        let altitude: i64 = [11],
        let latitude: f64 = [14],
        let longitude: f64 = [15] => {
            let event = FlightEvent::Position{ altitude, latitude, longitude };
            Ok( SbsRecord::Accepted( FlightUpdate{ icao24, event }) )
        } else {
            Err( parse_error!( "invalid airborne position message: {}", rec.line()) )
        }
    }
}

fn decode_airborne_velocity<'a> (rec: &CsvRecord<'a>, icao24: &'a str)->Result<SbsRecord<'a>> {
    extract_fields! { rec ?
        let ground_speed: i64 = [12],
        let vertical_rate: i64 = [16] => {
            let event = FlightEvent::Velocity{ ground_speed, vertical_rate };
            Ok( SbsRecord::Accepted( FlightUpdate{ icao24, event }) )
        } else {
            Err( parse_error!( "invalid airborne velocity message: {}", rec.line()) )
        }
    }
}
