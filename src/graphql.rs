use serde_json::{Value, json};

use crate::types::{Device, HeatingMode, Room};
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://particuliers-tiko.fr";
pub const GRAPHQL_PATH: &str = "/api/v3/graphql/";

// The vendor rejects requests that do not look like its own dashboard.
pub(crate) const ACCEPT: &str = "*/*";
pub(crate) const ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7";
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const LOGIN_QUERY: &str = "\
mutation LogIn($email: String!, $password: String!, $langCode: String, $retainSession: Boolean) {
  logIn(input: {email: $email, password: $password, langCode: $langCode, retainSession: $retainSession}) {
    token
    firstLogin
    user {
      id
      clientCustomerId
      properties { id allInstalled }
    }
  }
}";

const ROOMS_QUERY: &str = "\
query GetRooms($propertyId: Int!) {
  property(id: $propertyId) {
    rooms {
      id
      name
      currentTemperatureDegrees
      targetTemperatureDegrees
      humidity
      status { heatingOperating disconnected }
      mode { absence frost disableHeating }
    }
  }
}";

const DEVICES_QUERY: &str = "\
query GetDevices($propertyId: Int!) {
  property(id: $propertyId) {
    devices { id code type name mac }
  }
}";

const ADJUST_TEMPERATURE_QUERY: &str = "\
mutation SET_PROPERTY_ROOM_ADJUST_TEMPERATURE($propertyId: Int!, $roomId: Int!, $temperature: Float!) {
  setRoomAdjustTemperature(input: {propertyId: $propertyId, roomId: $roomId, temperature: $temperature}) {
    id
    adjustTemperature { active endDateTime temperature }
  }
}";

const ROOM_MODE_QUERY: &str = "\
mutation SetRoomMode($propertyId: Int!, $roomId: Int!, $mode: String!) {
  setRoomMode(input: {propertyId: $propertyId, roomId: $roomId, mode: $mode}) {
    id
    mode
  }
}";

pub fn login_operation(email: &str, password: &str) -> Value {
    json!({
        "operationName": "LogIn",
        "query": LOGIN_QUERY,
        "variables": {
            "email": email,
            "password": password,
            "langCode": "fr",
            "retainSession": true,
        }
    })
}

pub fn rooms_operation(property_id: i64) -> Value {
    json!({
        "operationName": "GetRooms",
        "query": ROOMS_QUERY,
        "variables": { "propertyId": property_id }
    })
}

pub fn devices_operation(property_id: i64) -> Value {
    json!({
        "operationName": "GetDevices",
        "query": DEVICES_QUERY,
        "variables": { "propertyId": property_id }
    })
}

pub fn adjust_temperature_operation(property_id: i64, room_id: i64, temperature: f64) -> Value {
    json!({
        "operationName": "SET_PROPERTY_ROOM_ADJUST_TEMPERATURE",
        "query": ADJUST_TEMPERATURE_QUERY,
        "variables": {
            "propertyId": property_id,
            "roomId": room_id,
            "temperature": temperature,
        }
    })
}

pub fn room_mode_operation(property_id: i64, room_id: i64, mode: HeatingMode) -> Value {
    json!({
        "operationName": "SetRoomMode",
        "query": ROOM_MODE_QUERY,
        "variables": {
            "propertyId": property_id,
            "roomId": room_id,
            "mode": mode.as_tiko_str(),
        }
    })
}

pub fn operation_name(op: &Value) -> &str {
    op.get("operationName").and_then(|v| v.as_str()).unwrap_or("")
}

/// Map a GraphQL-level error (200 response with an `errors` array) onto the
/// crate taxonomy. The vendor localizes some messages to French.
pub fn check_errors(body: &Value) -> Result<()> {
    let Some(Value::Array(errors)) = body.get("errors") else {
        return Ok(());
    };
    let message = errors
        .first()
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("unknown error")
        .to_string();

    if message.contains("Limite de taux atteinte") {
        return Err(Error::RateLimited(message));
    }
    if message.contains("Invalid credentials") {
        return Err(Error::Unauthorized(message));
    }
    Err(Error::Vendor(message))
}

/// Extract (token, user id, property id) from a `LogIn` response.
pub fn parse_login(body: &Value) -> Result<(String, i64, i64)> {
    let login = body
        .pointer("/data/logIn")
        .filter(|v| !v.is_null())
        .ok_or_else(|| Error::Vendor("no login data in response".to_string()))?;

    let token = login
        .get("token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Vendor("login response missing token".to_string()))?
        .to_string();
    let user_id = login
        .pointer("/user/id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::Vendor("login response missing user id".to_string()))?;
    let property_id = login
        .pointer("/user/properties/0/id")
        .and_then(|v| v.as_i64())
        .ok_or(Error::NoProperty)?;

    Ok((token, user_id, property_id))
}

pub fn parse_rooms(body: &Value) -> Result<Vec<Room>> {
    let rooms = body
        .pointer("/data/property/rooms")
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Vendor("invalid rooms response".to_string()))?;

    rooms.iter().map(parse_room).collect()
}

fn parse_room(data: &Value) -> Result<Room> {
    let id = data
        .get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::Vendor("room entry missing id".to_string()))?;

    let mode_flags = data.get("mode").unwrap_or(&Value::Null);
    let flag = |key: &str| mode_flags.get(key).and_then(|v| v.as_bool()).unwrap_or(false);

    Ok(Room {
        id,
        name: data
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        current_temperature: data
            .get("currentTemperatureDegrees")
            .and_then(|v| v.as_f64()),
        target_temperature: data
            .get("targetTemperatureDegrees")
            .and_then(|v| v.as_f64()),
        humidity: data.get("humidity").and_then(|v| v.as_f64()),
        heating: data
            .pointer("/status/heatingOperating")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        disconnected: data
            .pointer("/status/disconnected")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        mode: HeatingMode::from_flags(flag("absence"), flag("frost"), flag("disableHeating")),
    })
}

pub fn parse_devices(body: &Value) -> Result<Vec<Device>> {
    let devices = body
        .pointer("/data/property/devices")
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Vendor("invalid devices response".to_string()))?;

    devices
        .iter()
        .map(|data| {
            let id = data
                .get("id")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| Error::Vendor("device entry missing id".to_string()))?;
            let field = |key: &str| {
                data.get(key)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            Ok(Device {
                id,
                code: field("code"),
                kind: field("type"),
                name: field("name"),
                mac: field("mac"),
            })
        })
        .collect()
}
