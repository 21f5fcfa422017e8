/// Room-level heating mode as exposed by the vendor.
///
/// The vendor reports modes as boolean flags on the room (`disableHeating`,
/// `frost`, `absence`) and accepts them as strings on the mode mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeatingMode {
    /// Regular heating ("on").
    #[default]
    Normal,
    /// Heating fully disabled.
    Off,
    /// Frost protection floor temperature.
    FrostProtection,
    /// Away / absence setback.
    Away,
}

impl HeatingMode {
    pub fn as_tiko_str(&self) -> &'static str {
        match self {
            HeatingMode::Normal => "on",
            HeatingMode::Off => "off",
            HeatingMode::FrostProtection => "frost",
            HeatingMode::Away => "absence",
        }
    }

    pub fn from_tiko_str(s: &str) -> Option<Self> {
        match s {
            "on" => Some(HeatingMode::Normal),
            "off" => Some(HeatingMode::Off),
            "frost" => Some(HeatingMode::FrostProtection),
            "absence" => Some(HeatingMode::Away),
            _ => None,
        }
    }

    /// Decode the per-room mode flags. Precedence follows the vendor
    /// dashboard: absence wins over frost, frost over off.
    pub fn from_flags(absence: bool, frost: bool, disable_heating: bool) -> Self {
        if absence {
            HeatingMode::Away
        } else if frost {
            HeatingMode::FrostProtection
        } else if disable_heating {
            HeatingMode::Off
        } else {
            HeatingMode::Normal
        }
    }
}

/// Platform-facing HVAC mode of a climate entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Heat,
    Off,
}

/// What the radiators are doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HvacAction {
    #[default]
    Idle,
    Heating,
}

/// Preset overlay on top of the HVAC mode (maps FrostProtection to Eco,
/// Away to Away, everything else to None).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    None,
    Eco,
    Away,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub heating: bool,
    pub disconnected: bool,
    pub mode: HeatingMode,
}

/// Hardware attached to the property (heads, bridges). Read-only metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Device {
    pub id: i64,
    pub code: String,
    pub kind: String,
    pub name: String,
    pub mac: String,
}

/// Events emitted by the coordinator when a refresh changes room state.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    TemperatureChanged { room_id: i64, name: String, value: f64 },
    TargetChanged { room_id: i64, name: String, value: f64 },
    HumidityChanged { room_id: i64, name: String, value: f64 },
    ModeChanged { room_id: i64, name: String, mode: HeatingMode },
    HeatingChanged { room_id: i64, name: String, heating: bool },
    ConnectivityChanged { room_id: i64, name: String, connected: bool },
}
