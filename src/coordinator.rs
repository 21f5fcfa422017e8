use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::client::TikoClient;
use crate::config::DEFAULT_SCAN_INTERVAL;
use crate::entity::{ClimateEntity, SensorEntity, SensorKind};
use crate::types::{Device, HeatingMode, HvacMode, Preset, Room, RoomEvent};
use crate::{Error, Result};

type EventCallback = Box<dyn Fn(&RoomEvent) + Send + Sync>;

pub struct TikoCoordinatorBuilder {
    client: TikoClient,
    scan_interval: Duration,
    event_callbacks: Vec<EventCallback>,
}

impl TikoCoordinatorBuilder {
    pub fn new(client: TikoClient) -> Self {
        Self {
            client,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            event_callbacks: Vec::new(),
        }
    }

    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn on_event(mut self, f: impl Fn(&RoomEvent) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn build(self) -> TikoCoordinator {
        TikoCoordinator {
            client: self.client,
            scan_interval: self.scan_interval,
            rooms: BTreeMap::new(),
            devices: BTreeMap::new(),
            climates: BTreeMap::new(),
            sensors: BTreeMap::new(),
            available: false,
            event_callbacks: self.event_callbacks,
        }
    }
}

/// Host-driven poll coordinator: owns the client and the entity adapters,
/// replaces the room snapshot on every [`refresh`](Self::refresh), and fans
/// state changes out to registered callbacks.
pub struct TikoCoordinator {
    client: TikoClient,
    scan_interval: Duration,
    rooms: BTreeMap<i64, Room>,
    devices: BTreeMap<i64, Device>,
    climates: BTreeMap<i64, ClimateEntity>,
    sensors: BTreeMap<(i64, SensorKind), SensorEntity>,
    available: bool,
    event_callbacks: Vec<EventCallback>,
}

impl TikoCoordinator {
    pub fn builder(client: TikoClient) -> TikoCoordinatorBuilder {
        TikoCoordinatorBuilder::new(client)
    }

    /// How often the host should call [`refresh`](Self::refresh).
    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// Whether the last poll reached the vendor.
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room(&self, room_id: i64) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn climates(&self) -> impl Iterator<Item = &ClimateEntity> {
        self.climates.values()
    }

    pub fn climate(&self, room_id: i64) -> Option<&ClimateEntity> {
        self.climates.get(&room_id)
    }

    pub fn sensors(&self) -> impl Iterator<Item = &SensorEntity> {
        self.sensors.values()
    }

    pub fn sensor(&self, room_id: i64, kind: SensorKind) -> Option<&SensorEntity> {
        self.sensors.get(&(room_id, kind))
    }

    /// Fetch the current vendor state and reconcile entities against it.
    ///
    /// Rooms and devices are independent queries, fetched concurrently. A
    /// transport failure marks every entity unavailable (last-known state is
    /// kept for display) and returns the error for the host to log;
    /// authentication failures propagate untouched so the host can prompt
    /// for reauthentication.
    pub async fn refresh(&mut self) -> Result<()> {
        let (rooms, devices) =
            tokio::join!(self.client.list_rooms(), self.client.list_devices());

        let rooms = match rooms {
            Ok(rooms) => rooms,
            Err(e) => return Err(self.handle_refresh_error(e)),
        };
        let devices = match devices {
            Ok(devices) => devices,
            Err(e) => return Err(self.handle_refresh_error(e)),
        };

        let mut events = Vec::new();
        for room in &rooms {
            diff_room(self.rooms.get(&room.id), room, &mut events);
        }

        self.rooms = rooms.into_iter().map(|r| (r.id, r)).collect();
        self.devices = devices.into_iter().map(|d| (d.id, d)).collect();
        self.available = true;
        self.sync_entities();

        if !events.is_empty() {
            debug!(count = events.len(), "room state changes this poll");
        }
        for event in &events {
            for cb in &self.event_callbacks {
                cb(event);
            }
        }
        Ok(())
    }

    /// Set a room's target temperature. The adapter state is updated
    /// optimistically and reconciled on the next poll.
    pub async fn set_temperature(&mut self, room_id: i64, value: f64) -> Result<()> {
        if !self.rooms.contains_key(&room_id) {
            return Err(Error::UnknownRoom(room_id));
        }
        self.client.set_temperature(room_id, value).await?;

        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.target_temperature = Some(value);
        }
        if let Some(entity) = self.climates.get_mut(&room_id) {
            entity.set_target(value);
        }
        Ok(())
    }

    /// Set a room's heating mode, optimistically.
    pub async fn set_mode(&mut self, room_id: i64, mode: HeatingMode) -> Result<()> {
        if !self.rooms.contains_key(&room_id) {
            return Err(Error::UnknownRoom(room_id));
        }
        self.client.set_mode(room_id, mode).await?;

        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.mode = mode;
        }
        if let Some(entity) = self.climates.get_mut(&room_id) {
            entity.set_mode(mode);
        }
        Ok(())
    }

    /// Platform HVAC mode command: Heat resumes normal heating, Off disables
    /// the room.
    pub async fn set_hvac_mode(&mut self, room_id: i64, mode: HvacMode) -> Result<()> {
        let mode = match mode {
            HvacMode::Heat => HeatingMode::Normal,
            HvacMode::Off => HeatingMode::Off,
        };
        self.set_mode(room_id, mode).await
    }

    /// Platform preset command: Eco maps to frost protection, Away to the
    /// absence setback, None back to normal heating.
    pub async fn set_preset(&mut self, room_id: i64, preset: Preset) -> Result<()> {
        let mode = match preset {
            Preset::Eco => HeatingMode::FrostProtection,
            Preset::Away => HeatingMode::Away,
            Preset::None => HeatingMode::Normal,
        };
        self.set_mode(room_id, mode).await
    }

    fn handle_refresh_error(&mut self, err: Error) -> Error {
        if err.is_network() {
            debug!(error = %err, "poll failed, marking entities unavailable");
            self.available = false;
            for entity in self.climates.values_mut() {
                entity.set_available(false);
            }
            for sensor in self.sensors.values_mut() {
                sensor.set_available(false);
            }
        }
        err
    }

    fn sync_entities(&mut self) {
        let rooms = &self.rooms;
        self.climates.retain(|id, _| rooms.contains_key(id));
        self.sensors.retain(|(id, _), _| rooms.contains_key(id));

        for (id, room) in &self.rooms {
            self.climates
                .entry(*id)
                .or_insert_with(|| ClimateEntity::new(*id))
                .apply(room);
            for kind in [SensorKind::Temperature, SensorKind::Humidity] {
                self.sensors
                    .entry((*id, kind))
                    .or_insert_with(|| SensorEntity::new(*id, kind))
                    .apply(room);
            }
        }
    }
}

fn diff_room(prev: Option<&Room>, next: &Room, events: &mut Vec<RoomEvent>) {
    // A room seen for the first time diffs against the default snapshot, so
    // initial readings fire events too.
    let default = Room {
        id: next.id,
        ..Default::default()
    };
    let prev = prev.unwrap_or(&default);
    let name = next.name.clone();

    if next.current_temperature != prev.current_temperature
        && let Some(value) = next.current_temperature
    {
        events.push(RoomEvent::TemperatureChanged {
            room_id: next.id,
            name: name.clone(),
            value,
        });
    }
    if next.target_temperature != prev.target_temperature
        && let Some(value) = next.target_temperature
    {
        events.push(RoomEvent::TargetChanged {
            room_id: next.id,
            name: name.clone(),
            value,
        });
    }
    if next.humidity != prev.humidity
        && let Some(value) = next.humidity
    {
        events.push(RoomEvent::HumidityChanged {
            room_id: next.id,
            name: name.clone(),
            value,
        });
    }
    if next.mode != prev.mode {
        events.push(RoomEvent::ModeChanged {
            room_id: next.id,
            name: name.clone(),
            mode: next.mode,
        });
    }
    if next.heating != prev.heating {
        events.push(RoomEvent::HeatingChanged {
            room_id: next.id,
            name: name.clone(),
            heating: next.heating,
        });
    }
    if next.disconnected != prev.disconnected {
        events.push(RoomEvent::ConnectivityChanged {
            room_id: next.id,
            name,
            connected: !next.disconnected,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: i64) -> Room {
        Room {
            id,
            name: format!("Room {id}"),
            current_temperature: Some(19.0),
            target_temperature: Some(20.0),
            humidity: Some(50.0),
            heating: false,
            disconnected: false,
            mode: HeatingMode::Normal,
        }
    }

    #[test]
    fn diff_fires_initial_readings() {
        let mut events = Vec::new();
        diff_room(None, &room(1), &mut events);
        assert!(events
            .iter()
            .any(|e| matches!(e, RoomEvent::TemperatureChanged { room_id: 1, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, RoomEvent::TargetChanged { .. })));
        // Defaults match, so no mode/heating/connectivity noise.
        assert!(!events.iter().any(|e| matches!(e, RoomEvent::ModeChanged { .. })));
    }

    #[test]
    fn diff_unchanged_room_is_silent() {
        let r = room(1);
        let mut events = Vec::new();
        diff_room(Some(&r), &r, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn diff_detects_mode_and_connectivity() {
        let prev = room(1);
        let mut next = room(1);
        next.mode = HeatingMode::Away;
        next.disconnected = true;

        let mut events = Vec::new();
        diff_room(Some(&prev), &next, &mut events);
        assert!(events.iter().any(|e| matches!(
            e,
            RoomEvent::ModeChanged { mode: HeatingMode::Away, .. }
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            RoomEvent::ConnectivityChanged { connected: false, .. }
        )));
    }
}
