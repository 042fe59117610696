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

//! this module provides a zero-copy extractor for single line, comma separated records such as
//! the SBS-1 (BaseStation) messages produced by dump1090 and similar ADS-B receivers.
//!
//! Field values are borrowed from the line buffer and only converted on access, i.e. records we
//! are not interested in do not incur any parse cost beyond locating the separators.

use std::str::FromStr;
use memchr::memchr_iter;

/// syntactic sugar for typed extraction of several fields from a [`CsvRecord`]. The block is only
/// executed if all fields are present and parse into their respective types, otherwise the (mandatory)
/// else block is executed. Field indices are 0-based.
/// ```
///     use argus_common::{extract_fields, csv::CsvRecord};
///
///     let rec = CsvRecord::new("MSG,3,,,A04424,,,,,,,11025,,,37.17274,-122.03935");
///     let res = extract_fields! { rec ?
///         let altitude: i64 = [11],
///         let lat: f64 = [14] => {
///             Some((altitude,lat))
///         } else {
///             None
///         }
///     };
///     assert_eq!( res, Some((11025, 37.17274)));
/// ```
/// which gets expanded into:
/// ```text
///     {
///         let altitude: Option<i64> = rec.field::<i64>(11);
///         let lat: Option<f64> = rec.field::<f64>(14);
///         if let (Some(altitude), Some(lat),) = (altitude, lat,) { ... } else { ... }
///     }
/// ```
#[macro_export]
macro_rules! extract_fields {
    ($rec:ident ? $( let $var:ident : $vt:ty = [$idx:expr] ),+ => $blk:block else $else_blk:block) => {
        {
            $( let $var: Option<$vt> = $rec.field::<$vt>( $idx); )+
            if let ( $( Some($var), )+ ) = ( $( $var, )+ ) $blk else $else_blk
        }
    }
}

pub struct CsvRecord<'a> {
    line: &'a str,
    fields: Vec<&'a str>,
}

impl<'a> CsvRecord<'a> {
    pub fn new (line: &'a str)->Self {
        let line = line.trim_end_matches( |c| c == '\n' || c == '\r');
        let bytes = line.as_bytes();

        let mut fields = Vec::with_capacity(22);
        let mut i0 = 0;
        for i in memchr_iter( b',', bytes) {
            fields.push( &line[i0..i]); // ',' is ASCII so this is always a char boundary
            i0 = i + 1;
        }
        fields.push( &line[i0..]);

        CsvRecord { line, fields }
    }

    /// the source line without its line terminator
    pub fn line (&self)->&'a str { self.line }

    /// number of fields, which is always at least 1 (a line without separators is one field)
    pub fn len (&self)->usize { self.fields.len() }

    pub fn str_field (&self, idx: usize)->Option<&'a str> {
        self.fields.get(idx).copied()
    }

    /// the parsed value of field `idx`, or None if there is no such field or it does not parse. Note
    /// that values are not trimmed, i.e. " 42" is not a valid integer
    pub fn field<T: FromStr> (&self, idx: usize)->Option<T> {
        self.fields.get(idx).and_then( |s| s.parse::<T>().ok())
    }

    pub fn fields (&self)->impl Iterator<Item=&'a str> + '_ {
        self.fields.iter().copied()
    }
}
