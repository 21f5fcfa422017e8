use crate::types::{HeatingMode, HvacAction, HvacMode, Preset, Room};

pub const MIN_TARGET_TEMPERATURE: f64 = 7.0;
pub const MAX_TARGET_TEMPERATURE: f64 = 28.0;
pub const TARGET_TEMPERATURE_STEP: f64 = 0.5;

/// Platform-facing climate adapter for one room.
///
/// State is replaced from the vendor snapshot on every poll. Command paths
/// write through optimistically; the next poll reconciles whatever the
/// vendor actually applied.
#[derive(Debug, Clone)]
pub struct ClimateEntity {
    room_id: i64,
    name: String,
    current_temperature: Option<f64>,
    target_temperature: Option<f64>,
    mode: HeatingMode,
    heating: bool,
    available: bool,
}

impl ClimateEntity {
    pub(crate) fn new(room_id: i64) -> Self {
        Self {
            room_id,
            name: String::new(),
            current_temperature: None,
            target_temperature: None,
            mode: HeatingMode::Normal,
            heating: false,
            available: false,
        }
    }

    pub(crate) fn apply(&mut self, room: &Room) {
        self.name = room.name.clone();
        self.current_temperature = room.current_temperature;
        self.target_temperature = room.target_temperature;
        self.mode = room.mode;
        self.heating = room.heating;
        self.available = !room.disconnected;
    }

    pub(crate) fn set_target(&mut self, value: f64) {
        self.target_temperature = Some(value);
    }

    pub(crate) fn set_mode(&mut self, mode: HeatingMode) {
        self.mode = mode;
    }

    pub(crate) fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    pub fn unique_id(&self) -> String {
        format!("tiko_{}", self.room_id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.current_temperature
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.target_temperature
    }

    pub fn heating_mode(&self) -> HeatingMode {
        self.mode
    }

    pub fn hvac_mode(&self) -> HvacMode {
        match self.mode {
            HeatingMode::Off => HvacMode::Off,
            _ => HvacMode::Heat,
        }
    }

    pub fn hvac_action(&self) -> HvacAction {
        if self.heating {
            HvacAction::Heating
        } else {
            HvacAction::Idle
        }
    }

    pub fn preset(&self) -> Preset {
        match self.mode {
            HeatingMode::FrostProtection => Preset::Eco,
            HeatingMode::Away => Preset::Away,
            _ => Preset::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SensorKind {
    Temperature,
    Humidity,
}

impl SensorKind {
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "\u{00b0}C",
            SensorKind::Humidity => "%",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
        }
    }
}

/// Read-only numeric sensor derived from a room (current temperature or
/// relative humidity).
#[derive(Debug, Clone)]
pub struct SensorEntity {
    room_id: i64,
    kind: SensorKind,
    name: String,
    state: Option<f64>,
    available: bool,
}

impl SensorEntity {
    pub(crate) fn new(room_id: i64, kind: SensorKind) -> Self {
        Self {
            room_id,
            kind,
            name: String::new(),
            state: None,
            available: false,
        }
    }

    pub(crate) fn apply(&mut self, room: &Room) {
        self.name = format!("{} {}", room.name, self.kind.suffix());
        self.state = match self.kind {
            SensorKind::Temperature => room.current_temperature,
            SensorKind::Humidity => room.humidity,
        };
        self.available = !room.disconnected && self.state.is_some();
    }

    pub(crate) fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn unique_id(&self) -> String {
        format!("tiko_{}_{}", self.room_id, self.kind.suffix())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> Option<f64> {
        self.state
    }

    pub fn unit(&self) -> &'static str {
        self.kind.unit()
    }

    pub fn available(&self) -> bool {
        self.available
    }
}
