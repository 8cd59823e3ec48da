//! Propiedades de extremo a extremo del ciclo de ingesta con dobles en memoria

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use rstest::{fixture, rstest};

use vehicle_tracker::models::{
    IngestionStatus, OnOff, Position, ReadingFilters, VehicleAttributePolicy, YesNo,
};
use vehicle_tracker::repositories::ReadingStore;
use vehicle_tracker::services::{IngestionPipeline, RegistryResolver};
use vehicle_tracker::test_support::{
    sample_settings, FixedClock, InMemoryReadingStore, InMemoryRunLog, InMemorySettingsStore,
    InMemoryVehicleStore, StaticTelemetrySource,
};

struct World {
    vehicles: Arc<InMemoryVehicleStore>,
    readings: Arc<InMemoryReadingStore>,
    runs: Arc<InMemoryRunLog>,
}

impl World {
    fn pipeline(&self, source: StaticTelemetrySource) -> IngestionPipeline {
        IngestionPipeline::new(
            Arc::new(InMemorySettingsStore::with(sample_settings())),
            Arc::new(source),
            RegistryResolver::new(self.vehicles.clone(), VehicleAttributePolicy::default()),
            self.readings.clone(),
            self.runs.clone(),
            Arc::new(FixedClock::default()),
        )
    }
}

#[fixture]
fn world() -> World {
    World {
        vehicles: Arc::new(InMemoryVehicleStore::default()),
        readings: Arc::new(InMemoryReadingStore::default()),
        runs: Arc::new(InMemoryRunLog::default()),
    }
}

const FLEET_BODY: &str = r#"[
    {
        "vehicleNo": "DXB-10231",
        "vehicleName": "Reefer 31",
        "make": "Isuzu",
        "model": "NPR",
        "odometer": 120455.5,
        "uom": "Km",
        "position": "M",
        "ignition": "1",
        "ac": true,
        "camera": "0",
        "geofence": "Y",
        "alert": "no",
        "speed": 64,
        "lat": 25.2048,
        "lng": 55.2708,
        "lastComunicationTime": 1700000000000,
        "lastSeen": "14-11-2023 22:13:20",
        "celsius": "-18.5",
        "imeiNo": "356938035643809"
    },
    {
        "position": "P",
        "speed": 0
    },
    {
        "vehicleNo": "DXB-20877",
        "position": "X",
        "ac": "True",
        "lat": 25.1,
        "installationDate": "15-01-2024"
    }
]"#;

#[rstest]
#[tokio::test]
async fn test_fleet_cycle_normalizes_every_entry(world: World) {
    let outcome = world.pipeline(StaticTelemetrySource::ok(FLEET_BODY)).run().await;

    assert_eq!(outcome.status, IngestionStatus::Success);
    assert_eq!(outcome.processed.len(), 2);
    assert_eq!(outcome.skipped, 1);

    let moving = world
        .readings
        .list(&ReadingFilters {
            reg_no: Some("DXB-10231".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(moving.len(), 1);
    let fields = &moving[0].fields;
    assert_eq!(fields.position, Position::Moving);
    assert_eq!(fields.ignition, OnOff::On);
    assert_eq!(fields.ac, OnOff::On);
    assert_eq!(fields.camera, OnOff::Off);
    assert_eq!(fields.geofence, YesNo::Yes);
    assert_eq!(fields.alert, YesNo::No);
    assert_eq!(fields.temperature_celsius, Some(-18.5));
    assert_eq!(
        fields.last_communication,
        Some(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap())
    );
    assert_eq!(fields.last_seen, fields.last_communication);
    assert_eq!(
        fields.map_link.as_deref(),
        Some("https://www.google.com/maps?q=25.2048,55.2708")
    );
    assert_eq!(fields.extra_fields.len(), 1);

    let parked = world
        .readings
        .list(&ReadingFilters {
            reg_no: Some("DXB-20877".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(parked[0].fields.position, Position::Parked);
    assert_eq!(parked[0].fields.ac, OnOff::On);
    assert_eq!(parked[0].fields.map_link, None);
}

#[rstest]
#[tokio::test]
async fn test_vehicles_are_created_before_their_readings(world: World) {
    world.pipeline(StaticTelemetrySource::ok(FLEET_BODY)).run().await;

    let vehicles = world.vehicles.all();
    assert_eq!(vehicles.len(), 2);
    for reading in world.readings.all() {
        let vehicle = vehicles
            .iter()
            .find(|vehicle| vehicle.id == reading.vehicle_id)
            .expect("reading references a registered vehicle");
        assert_eq!(vehicle.license_plate, reading.fields.reg_no);
    }

    let reefer = vehicles
        .iter()
        .find(|vehicle| vehicle.license_plate == "DXB-10231")
        .unwrap();
    assert_eq!(reefer.vehicle_name, "Reefer 31");
    assert_eq!(reefer.make, "Isuzu");

    let bare = vehicles
        .iter()
        .find(|vehicle| vehicle.license_plate == "DXB-20877")
        .unwrap();
    assert_eq!(bare.vehicle_name, "DXB-20877");
    assert_eq!(bare.make, "Unknown");
    assert_eq!(bare.model, "Unknown");
}

#[rstest]
#[tokio::test]
async fn test_second_cycle_appends_readings_and_keeps_vehicles(world: World) {
    let body = r#"[{"vehicleNo": "DXB-1", "make": "Isuzu"}]"#;
    world.pipeline(StaticTelemetrySource::ok(body)).run().await;

    let body = r#"[{"vehicleNo": "DXB-1", "make": "Hino"}]"#;
    world.pipeline(StaticTelemetrySource::ok(body)).run().await;

    assert_eq!(world.readings.count(), 2);
    let vehicles = world.vehicles.all();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].make, "Isuzu");
    assert_eq!(world.runs.all().len(), 2);
}

#[rstest]
#[case(StatusCode::OK, r#"{"data": []}"#, "Malformed response")]
#[case(StatusCode::OK, "", "Malformed response")]
#[case(StatusCode::OK, "not json", "Malformed response")]
#[case(StatusCode::SERVICE_UNAVAILABLE, "[]", "Remote API returned HTTP 503")]
#[tokio::test]
async fn test_bad_responses_abort_without_persisting(
    world: World,
    #[case] status: StatusCode,
    #[case] body: &str,
    #[case] expected: &str,
) {
    let outcome = world
        .pipeline(StaticTelemetrySource::new(status, body))
        .run()
        .await;

    assert_eq!(outcome.status, IngestionStatus::Error);
    assert!(outcome.message.unwrap().starts_with(expected));
    assert_eq!(world.readings.count(), 0);
    assert_eq!(world.vehicles.count(), 0);

    let runs = world.runs.all();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "error");
}
