use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tiko_cloud::{
    Error, HeatingMode, HvacMode, RoomEvent, SensorKind, TikoClient, TikoCoordinator,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRAPHQL: &str = "/api/v3/graphql/";

fn login_body() -> Value {
    json!({
        "data": {"logIn": {
            "token": "tok123",
            "user": {"id": 1, "properties": [{"id": 77}]}
        }}
    })
}

fn room_json(id: i64, name: &str, target: f64, off: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "currentTemperatureDegrees": 19.0,
        "targetTemperatureDegrees": target,
        "humidity": 51.0,
        "status": {"heatingOperating": false, "disconnected": false},
        "mode": {"absence": false, "frost": false, "disableHeating": off}
    })
}

fn rooms_body(rooms: Vec<Value>) -> Value {
    json!({"data": {"property": {"rooms": rooms}}})
}

fn devices_body() -> Value {
    json!({"data": {"property": {"devices": [
        {"id": 10, "code": "A1B2", "type": "head", "name": "Salon head", "mac": "aa:bb"}
    ]}}})
}

async fn mount_common(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL))
        .and(body_string_contains("LogIn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL))
        .and(body_string_contains("GetDevices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .mount(server)
        .await;
}

async fn mount_rooms(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(GRAPHQL))
        .and(body_string_contains("GetRooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_rooms_once(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(GRAPHQL))
        .and(body_string_contains("GetRooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

fn coordinator_for(server: &MockServer) -> TikoCoordinator {
    let client = TikoClient::builder("user@example.com", "hunter2")
        .base_url(server.uri())
        .build();
    TikoCoordinator::builder(client).build()
}

#[tokio::test]
async fn refresh_builds_one_entity_per_room() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms(
        &server,
        rooms_body(vec![
            room_json(1, "Salon", 20.0, false),
            room_json(2, "Bureau", 19.0, false),
        ]),
    )
    .await;

    let mut coordinator = coordinator_for(&server);
    coordinator.refresh().await.unwrap();

    assert!(coordinator.available());
    assert_eq!(coordinator.climates().count(), 2);
    assert_eq!(coordinator.sensors().count(), 4);
    assert_eq!(coordinator.devices().count(), 1);

    let climate = coordinator.climate(1).expect("room 1 should have a climate");
    assert_eq!(climate.unique_id(), "tiko_1");
    assert_eq!(climate.name(), "Salon");
    assert_eq!(climate.target_temperature(), Some(20.0));
    assert!(climate.available());

    let humidity = coordinator
        .sensor(1, SensorKind::Humidity)
        .expect("room 1 should have a humidity sensor");
    assert_eq!(humidity.state(), Some(51.0));
    assert_eq!(humidity.unit(), "%");
}

#[tokio::test]
async fn repeated_polls_do_not_duplicate_entities() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms(
        &server,
        rooms_body(vec![
            room_json(1, "Salon", 20.0, false),
            room_json(2, "Bureau", 19.0, false),
        ]),
    )
    .await;

    let mut coordinator = coordinator_for(&server);
    coordinator.refresh().await.unwrap();
    coordinator.refresh().await.unwrap();
    coordinator.refresh().await.unwrap();

    assert_eq!(coordinator.climates().count(), 2);
    assert_eq!(coordinator.sensors().count(), 4);
}

#[tokio::test]
async fn removed_room_drops_its_entities() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms_once(
        &server,
        rooms_body(vec![
            room_json(1, "Salon", 20.0, false),
            room_json(2, "Bureau", 19.0, false),
        ]),
    )
    .await;
    mount_rooms(&server, rooms_body(vec![room_json(1, "Salon", 20.0, false)])).await;

    let mut coordinator = coordinator_for(&server);
    coordinator.refresh().await.unwrap();
    assert_eq!(coordinator.climates().count(), 2);

    coordinator.refresh().await.unwrap();
    assert_eq!(coordinator.climates().count(), 1);
    assert!(coordinator.climate(2).is_none());
    assert!(coordinator.sensor(2, SensorKind::Temperature).is_none());
}

#[tokio::test]
async fn set_mode_off_reads_back_off() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms_once(&server, rooms_body(vec![room_json(1, "Salon", 20.0, false)])).await;
    // Reconciling poll reports the room as disabled, matching the command.
    mount_rooms(&server, rooms_body(vec![room_json(1, "Salon", 20.0, true)])).await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL))
        .and(body_string_contains("SetRoomMode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"setRoomMode": {"id": 1, "mode": "off"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator = coordinator_for(&server);
    coordinator.refresh().await.unwrap();
    assert_eq!(coordinator.climate(1).unwrap().hvac_mode(), HvacMode::Heat);

    coordinator.set_hvac_mode(1, HvacMode::Off).await.unwrap();
    // Optimistic update, before any reconciliation.
    assert_eq!(coordinator.climate(1).unwrap().hvac_mode(), HvacMode::Off);
    assert_eq!(
        coordinator.room(1).unwrap().mode,
        HeatingMode::Off
    );

    coordinator.refresh().await.unwrap();
    // Reconciled against the vendor snapshot.
    assert_eq!(coordinator.climate(1).unwrap().hvac_mode(), HvacMode::Off);
}

#[tokio::test]
async fn eco_preset_maps_to_frost_protection() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms(&server, rooms_body(vec![room_json(1, "Salon", 20.0, false)])).await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL))
        .and(body_string_contains("SetRoomMode"))
        .and(body_string_contains("frost"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"setRoomMode": {"id": 1, "mode": "frost"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator = coordinator_for(&server);
    coordinator.refresh().await.unwrap();

    coordinator
        .set_preset(1, tiko_cloud::Preset::Eco)
        .await
        .unwrap();
    assert_eq!(
        coordinator.climate(1).unwrap().heating_mode(),
        HeatingMode::FrostProtection
    );
    assert_eq!(
        coordinator.climate(1).unwrap().preset(),
        tiko_cloud::Preset::Eco
    );
}

#[tokio::test]
async fn set_temperature_updates_optimistically() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms(&server, rooms_body(vec![room_json(1, "Salon", 20.0, false)])).await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL))
        .and(body_string_contains("SET_PROPERTY_ROOM_ADJUST_TEMPERATURE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"setRoomAdjustTemperature": {"id": 1}}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator = coordinator_for(&server);
    coordinator.refresh().await.unwrap();

    coordinator.set_temperature(1, 21.5).await.unwrap();
    assert_eq!(
        coordinator.climate(1).unwrap().target_temperature(),
        Some(21.5)
    );
}

#[tokio::test]
async fn command_for_unknown_room_is_rejected_locally() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms(&server, rooms_body(vec![room_json(1, "Salon", 20.0, false)])).await;

    let mut coordinator = coordinator_for(&server);
    coordinator.refresh().await.unwrap();

    let err = coordinator.set_temperature(99, 21.0).await.unwrap_err();
    assert!(matches!(err, Error::UnknownRoom(99)));
}

#[tokio::test]
async fn failed_poll_marks_entities_unavailable() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms_once(&server, rooms_body(vec![room_json(1, "Salon", 20.0, false)])).await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL))
        .and(body_string_contains("GetRooms"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut coordinator = coordinator_for(&server);
    coordinator.refresh().await.unwrap();
    assert!(coordinator.climate(1).unwrap().available());

    let err = coordinator.refresh().await.unwrap_err();
    assert!(err.is_network(), "expected network error, got {err:?}");
    assert!(!coordinator.available());
    assert!(!coordinator.climate(1).unwrap().available());
    assert!(!coordinator.sensor(1, SensorKind::Temperature).unwrap().available());
    // Last-known state is kept for display.
    assert_eq!(
        coordinator.climate(1).unwrap().target_temperature(),
        Some(20.0)
    );
}

#[tokio::test]
async fn state_changes_fire_events() {
    let server = MockServer::start().await;
    mount_common(&server).await;
    mount_rooms_once(&server, rooms_body(vec![room_json(1, "Salon", 20.0, false)])).await;
    mount_rooms(&server, rooms_body(vec![room_json(1, "Salon", 22.0, false)])).await;

    let events: Arc<Mutex<Vec<RoomEvent>>> = Arc::new(Mutex::new(vec![]));
    let events_clone = events.clone();

    let client = TikoClient::builder("user@example.com", "hunter2")
        .base_url(server.uri())
        .build();
    let mut coordinator = TikoCoordinator::builder(client)
        .on_event(move |event| {
            events_clone.lock().unwrap().push(event.clone());
        })
        .build();

    coordinator.refresh().await.unwrap();
    let first_count = events.lock().unwrap().len();
    assert!(first_count > 0, "first poll should fire initial events");

    events.lock().unwrap().clear();
    coordinator.refresh().await.unwrap();

    let captured = events.lock().unwrap();
    assert_eq!(captured.len(), 1, "only the target change should fire");
    assert!(matches!(
        captured[0],
        RoomEvent::TargetChanged { room_id: 1, value, .. } if (value - 22.0).abs() < 1e-9
    ));
}
