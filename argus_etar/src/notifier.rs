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

//! outbound alerts for flights that were classified as approaching

use std::{env, sync::Arc};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::{FlightState, errors::{Result, ArgusError, config_error}};

/// what we know about a flight at the time it was classified as approaching
#[derive(Serialize,Debug,Clone,PartialEq)]
pub struct EtarAlert {
    pub icao24: String,
    pub callsign: Option<String>,
    pub altitude: Option<i64>,
    pub vertical_rate: Option<i64>,
    pub message_count: u64,
    pub time: DateTime<Utc>,
}

impl EtarAlert {
    pub fn new (icao24: &str, flight: &FlightState, time: DateTime<Utc>)->Self {
        EtarAlert {
            icao24: icao24.to_string(),
            callsign: flight.callsign.clone(),
            altitude: flight.altitude,
            vertical_rate: flight.vertical_rate,
            message_count: flight.message_count,
            time
        }
    }

    /// the human readable alert text
    pub fn message (&self)->String {
        match self.callsign.as_deref().map( str::trim) {
            Some(cs) if !cs.is_empty() => format!("Incoming: Flight {cs}, http://flightaware.com/live/flight/{cs}"),
            _ => "Incoming: Flight with unknown callsign.".to_string()
        }
    }
}

/// the abstraction of an outbound alert channel. Implementations should not retry - failures are reported
/// by the caller and do not affect the flight store
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name (&self)->&str;
    async fn notify (&self, alert: &EtarAlert)->Result<()>;
}

/// configuration of the notifier to use. Credentials are not stored in config files - we only keep the names
/// of the environment variables that hold them
#[derive(Deserialize,Serialize,Debug,Clone,PartialEq,Default)]
pub enum NotifierConfig {
    #[default]
    Log,
    Slack { token_env: String, channel_id: String },
    Webhook { url: String, token_env: Option<String> },
}

impl NotifierConfig {
    /// instantiate the configured notifier. This fails if required credentials are not set
    pub fn build (&self)->Result<Arc<dyn Notifier>> {
        match self {
            NotifierConfig::Log => Ok( Arc::new( LogNotifier{}) ),
            NotifierConfig::Slack { token_env, channel_id } => {
                let token = env_credential( token_env)?;
                Ok( Arc::new( SlackNotifier::new( token, channel_id.clone())) )
            }
            NotifierConfig::Webhook { url, token_env } => {
                let token = match token_env {
                    Some(var) => Some( env_credential( var)? ),
                    None => None
                };
                Ok( Arc::new( WebhookNotifier::new( url.clone(), token)) )
            }
        }
    }
}

fn env_credential (var: &str)->Result<String> {
    match env::var( var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err( config_error!( "credential env var {} not set (use export {}=<token>)", var, var) )
    }
}

/// a notifier that only reports alerts in the log
pub struct LogNotifier {}

#[async_trait]
impl Notifier for LogNotifier {
    fn name (&self)->&str { "log" }

    async fn notify (&self, alert: &EtarAlert)->Result<()> {
        info!( icao24 = %alert.icao24, altitude = ?alert.altitude, vertical_rate = ?alert.vertical_rate, "{}", alert.message());
        Ok(())
    }
}

const SLACK_POST_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Deserialize,Debug)]
struct SlackResponse {
    ok: bool,
    error: Option<String>
}

/// posts alerts as chat text messages to a Slack channel (note channel_id is not a channel name)
pub struct SlackNotifier {
    client: Client,
    token: String,
    channel_id: String,
}

impl SlackNotifier {
    pub fn new (token: String, channel_id: String)->Self {
        SlackNotifier { client: Client::new(), token, channel_id }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name (&self)->&str { "slack" }

    async fn notify (&self, alert: &EtarAlert)->Result<()> {
        let text = alert.message();
        let params: [(&str,&str);2] = [ ("channel", self.channel_id.as_str()), ("text", text.as_str()) ];

        let resp: SlackResponse = self.client.post( SLACK_POST_URL)
            .bearer_auth( &self.token)
            .query( &params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if resp.ok {
            Ok(())
        } else {
            Err( ArgusError::NotifyError( format!("slack rejected message: {}", resp.error.unwrap_or_default())) )
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: String,
    #[serde(flatten)]
    alert: &'a EtarAlert,
}

/// posts alerts as JSON objects `{"text": <message>, "icao24": .., ...}` to a generic HTTP endpoint
pub struct WebhookNotifier {
    client: Client,
    url: String,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new (url: String, token: Option<String>)->Self {
        WebhookNotifier { client: Client::new(), url, token }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name (&self)->&str { "webhook" }

    async fn notify (&self, alert: &EtarAlert)->Result<()> {
        let payload = WebhookPayload { text: alert.message(), alert };

        let mut req = self.client.post( self.url.as_str()).json( &payload);
        if let Some(token) = &self.token {
            req = req.bearer_auth( token);
        }
        req.send().await?.error_for_status()?;

        Ok(())
    }
}
