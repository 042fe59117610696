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

use std::{fs, path::Path, time::Duration};
use serde::Deserialize;
use argus_common::datetime::{deserialize_duration, secs, minutes};

use crate::{classifier::EtarCriteria, notifier::NotifierConfig, errors::{Result, ArgusError, config_error}};

/// where and how we read SBS records from
#[derive(Deserialize,Debug,Clone,PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub addr: String, // host:port of the SBS socket (dump1090 serves this on port 30003)

    pub reconnect_attempts: u32, // how often we try to re-establish a lost connection before giving up

    #[serde(deserialize_with="deserialize_duration")]
    pub reconnect_delay: Duration,
}

impl Default for FeedConfig {
    fn default()->Self {
        FeedConfig { addr: "127.0.0.1:30003".to_string(), reconnect_attempts: 1, reconnect_delay: secs(5) }
    }
}

/// the configuration for the argus_etar process, read from a RON file such as
/// ```text
/// EtarConfig(
///     feed: ( addr: "192.168.1.22:30003" ),
///     eval_interval: "60s",
///     stale_after: "15min",
///     notifier: Slack( token_env: "SLACK_TOKEN", channel_id: "C0123456" ),
/// )
/// ```
/// Missing fields are set to their defaults
#[derive(Deserialize,Debug,Clone,PartialEq)]
#[serde(default)]
pub struct EtarConfig {
    pub feed: FeedConfig,

    #[serde(deserialize_with="deserialize_duration")]
    pub eval_interval: Duration, // interval of evaluation cycles

    #[serde(deserialize_with="deserialize_duration")]
    pub stale_after: Duration, // flights without reports for this long are dropped

    #[serde(deserialize_with="deserialize_duration")]
    pub notify_timeout: Duration, // max time we wait for a notification to be delivered

    pub criteria: EtarCriteria,
    pub notifier: NotifierConfig,
    pub print_flights: bool, // log the flight table on each evaluation cycle
}

impl Default for EtarConfig {
    fn default()->Self {
        EtarConfig {
            feed: FeedConfig::default(),
            eval_interval: secs(60),
            stale_after: minutes(15),
            notify_timeout: secs(10),
            criteria: EtarCriteria::default(),
            notifier: NotifierConfig::default(),
            print_flights: false,
        }
    }
}

impl EtarConfig {
    /// check values that would break the evaluation loop
    pub fn validate (&self)->Result<()> {
        if self.eval_interval.is_zero() { return Err( config_error!("eval_interval has to be > 0")) }
        if self.notify_timeout.is_zero() { return Err( config_error!("notify_timeout has to be > 0")) }
        if self.feed.addr.is_empty() { return Err( config_error!("no feed address")) }
        Ok(())
    }
}

pub fn parse_config (src: &str)->Result<EtarConfig> {
    let config: EtarConfig = ron::from_str( src)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config<P: AsRef<Path>> (path: P)->Result<EtarConfig> {
    let path = path.as_ref();
    let src = fs::read_to_string( path)
        .map_err( |e| ArgusError::ConfigError( format!("cannot read config {}: {}", path.display(), e)))?;
    parse_config( &src)
}
