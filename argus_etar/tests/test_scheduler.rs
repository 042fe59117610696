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

mod common;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use argus_common::datetime::{millis, minutes, secs, utc_now};
use argus_etar::{
    FlightStore, config::EtarConfig, event::FlightEvent, ingest::SbsIngestor,
    scheduler::{EvaluationScheduler, SchedulerState}
};
use common::{at, identity, position, velocity, RecordingNotifier, FailingNotifier};

const FLIGHT: &str = "4CA123";

fn setup (notifier: Arc<RecordingNotifier>)->(Arc<FlightStore>, SbsIngestor, EvaluationScheduler) {
    let config = EtarConfig::default();
    let store = Arc::new( FlightStore::new());
    let ingestor = SbsIngestor::new( config.feed.clone(), store.clone());
    let scheduler = EvaluationScheduler::new( &config, store.clone(), notifier)
        .with_ingest_stats( ingestor.stats());
    (store, ingestor, scheduler)
}

/// feed one identity report followed by 11 position and 11 velocity reports of a descending flight
fn feed_approach (ingestor: &SbsIngestor, icao24: &str, callsign: Option<&str>, secs: i64) {
    if let Some(cs) = callsign {
        ingestor.process_line( &identity( icao24, cs), at(secs));
    }
    for _ in 0..11 {
        ingestor.process_line( &position( icao24, 2000, 53.42, -6.27), at(secs));
        ingestor.process_line( &velocity( icao24, 200, -500), at(secs));
    }
}

#[tokio::test]
async fn test_single_notification () {
    let notifier = Arc::new( RecordingNotifier::default());
    let (store, ingestor, mut scheduler) = setup( notifier.clone());

    feed_approach( &ingestor, FLIGHT, Some("ABC123  "), 0);
    assert_eq!( ingestor.stats().created(), 1);
    assert_eq!( store.get( FLIGHT).unwrap().message_count, 22);

    let report = scheduler.evaluate( at(60));
    scheduler.flush().await;
    assert_eq!( report.evaluated, 1);
    assert_eq!( report.alerted, vec![FLIGHT.to_string()]);
    assert!( report.evicted.is_empty());

    assert_eq!( notifier.messages(), vec!["Incoming: Flight ABC123, http://flightaware.com/live/flight/ABC123".to_string()]);
    assert!( store.get( FLIGHT).unwrap().notified);
    assert_eq!( scheduler.stats().notified(), 1);

    // still approaching but already notified
    feed_approach( &ingestor, FLIGHT, None, 90);
    let report = scheduler.evaluate( at(120));
    scheduler.flush().await;
    assert!( report.alerted.is_empty());
    assert_eq!( notifier.count(), 1);
    assert_eq!( scheduler.stats().cycles(), 2);
    assert_eq!( scheduler.state(), SchedulerState::Idle);
}

#[tokio::test]
async fn test_not_approaching () {
    let notifier = Arc::new( RecordingNotifier::default());
    let (store, ingestor, mut scheduler) = setup( notifier.clone());

    // climbing
    ingestor.process_line( &identity( "A1B2C3", "DAL12"), at(0));
    for _ in 0..11 {
        ingestor.process_line( &position( "A1B2C3", 2000, 53.42, -6.27), at(0));
        ingestor.process_line( &velocity( "A1B2C3", 180, 1200), at(0));
    }
    // too few reports
    ingestor.process_line( &position( "B2C3D4", 1500, 53.42, -6.27), at(0));
    ingestor.process_line( &velocity( "B2C3D4", 150, -700), at(0));

    let report = scheduler.evaluate( at(30));
    scheduler.flush().await;
    assert_eq!( report.evaluated, 2);
    assert!( report.alerted.is_empty());
    assert_eq!( notifier.count(), 0);
    assert!( !store.get( "A1B2C3").unwrap().notified);
    assert!( !store.get( "B2C3D4").unwrap().notified);
}

#[tokio::test]
async fn test_renotify_after_eviction () {
    let notifier = Arc::new( RecordingNotifier::default());
    let (store, ingestor, mut scheduler) = setup( notifier.clone());

    feed_approach( &ingestor, FLIGHT, Some("ABC123"), 0);
    scheduler.evaluate( at(60));
    scheduler.flush().await;
    assert_eq!( notifier.count(), 1);

    // nothing received for more than stale_after
    let report = scheduler.evaluate( at(16*60));
    assert_eq!( report.evicted, vec![FLIGHT.to_string()]);
    assert_eq!( report.evaluated, 0);
    assert!( !store.contains( FLIGHT));
    assert_eq!( scheduler.stats().evicted(), 1);

    // the flight shows up again as a new entity
    feed_approach( &ingestor, FLIGHT, Some("ABC123"), 17*60);
    assert!( !store.get( FLIGHT).unwrap().notified);
    let report = scheduler.evaluate( at(18*60));
    scheduler.flush().await;
    assert_eq!( report.alerted, vec![FLIGHT.to_string()]);
    assert_eq!( notifier.count(), 2);
}

#[tokio::test]
async fn test_unknown_callsign () {
    let notifier = Arc::new( RecordingNotifier::default());
    let (_store, ingestor, mut scheduler) = setup( notifier.clone());

    feed_approach( &ingestor, FLIGHT, None, 0);
    scheduler.evaluate( at(60));
    scheduler.flush().await;
    assert_eq!( notifier.messages(), vec!["Incoming: Flight with unknown callsign.".to_string()]);

    let alert = notifier.alerts.lock().unwrap()[0].clone();
    assert_eq!( alert.icao24, FLIGHT);
    assert_eq!( alert.callsign, None);
    assert_eq!( alert.altitude, Some(2000));
    assert_eq!( alert.vertical_rate, Some(-500));
    assert_eq!( alert.time, at(60));
}

#[tokio::test]
async fn test_failed_notification () {
    let config = EtarConfig::default();
    let store = Arc::new( FlightStore::new());
    let mut scheduler = EvaluationScheduler::new( &config, store.clone(), Arc::new( FailingNotifier{}));

    for _ in 0..11 {
        store.merge( FLIGHT, &FlightEvent::Position{ altitude: 2000, latitude: 53.42, longitude: -6.27 }, at(0));
    }
    store.merge( FLIGHT, &FlightEvent::Velocity{ ground_speed: 200, vertical_rate: -500 }, at(0));

    let report = scheduler.evaluate( at(60));
    scheduler.flush().await;
    assert_eq!( report.alerted, vec![FLIGHT.to_string()]);
    assert_eq!( scheduler.stats().notify_failures(), 1);
    assert_eq!( scheduler.stats().notified(), 0);

    // failures are not retried
    assert!( store.get( FLIGHT).unwrap().notified);
    let report = scheduler.evaluate( at(120));
    scheduler.flush().await;
    assert!( report.alerted.is_empty());
    assert_eq!( scheduler.stats().notify_failures(), 1);
}

#[tokio::test]
async fn test_dispatch_timeout () {
    struct StalledNotifier {}

    #[async_trait::async_trait]
    impl argus_etar::notifier::Notifier for StalledNotifier {
        fn name (&self)->&str { "stalled" }
        async fn notify (&self, _alert: &argus_etar::notifier::EtarAlert)->argus_etar::errors::Result<()> {
            tokio::time::sleep( minutes(10)).await;
            Ok(())
        }
    }

    let mut config = EtarConfig::default();
    config.notify_timeout = millis(50);
    let store = Arc::new( FlightStore::new());
    let ingestor = SbsIngestor::new( config.feed.clone(), store.clone());
    let mut scheduler = EvaluationScheduler::new( &config, store.clone(), Arc::new( StalledNotifier{}));

    feed_approach( &ingestor, FLIGHT, Some("ABC123"), 0);
    scheduler.evaluate( at(60));
    scheduler.flush().await;

    assert_eq!( scheduler.stats().notify_failures(), 1);
    assert!( store.get( FLIGHT).unwrap().notified);
}

#[tokio::test]
async fn test_run_until_cancelled () {
    let notifier = Arc::new( RecordingNotifier::default());
    let mut config = EtarConfig::default();
    config.eval_interval = millis(20);
    let store = Arc::new( FlightStore::new());
    let ingestor = SbsIngestor::new( config.feed.clone(), store.clone());
    let scheduler = EvaluationScheduler::new( &config, store.clone(), notifier.clone());
    let stats = scheduler.stats();

    let now = utc_now();
    ingestor.process_line( &identity( FLIGHT, "ABC123"), now);
    for _ in 0..11 {
        ingestor.process_line( &position( FLIGHT, 2000, 53.42, -6.27), now);
        ingestor.process_line( &velocity( FLIGHT, 200, -500), now);
    }

    let cancel = CancellationToken::new();
    let task = tokio::spawn( scheduler.run( cancel.clone()));
    tokio::time::sleep( millis(150)).await;
    cancel.cancel();
    tokio::time::timeout( secs(5), task).await.expect("scheduler did not terminate").unwrap();

    assert!( stats.cycles() >= 1);
    assert_eq!( notifier.count(), 1);
    assert!( store.get( FLIGHT).unwrap().notified);
}
