//! Modelo de Reading
//!
//! Una lectura es una foto inmutable de la telemetría de un vehículo en un
//! momento dado. Las lecturas sólo se agregan, nunca se actualizan.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use uuid::Uuid;

/// Estado de posición/movimiento del vehículo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Parked,
    Moving,
    Stopped,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Parked => "Parked",
            Position::Moving => "Moving",
            Position::Stopped => "Stopped",
        }
    }

    /// Traducir el código del proveedor; cualquier código desconocido es Parked
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" | "MOVING" => Position::Moving,
            "S" | "STOPPED" => Position::Stopped,
            _ => Position::Parked,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interruptores reportados como ON/OFF (ignición, aire acondicionado, cámara)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OnOff {
    On,
    #[default]
    Off,
}

impl OnOff {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnOff::On => "ON",
            OnOff::Off => "OFF",
        }
    }

    pub fn parse_stored(value: &str) -> Self {
        if value.eq_ignore_ascii_case("ON") {
            OnOff::On
        } else {
            OnOff::Off
        }
    }
}

impl From<bool> for OnOff {
    fn from(flag: bool) -> Self {
        if flag {
            OnOff::On
        } else {
            OnOff::Off
        }
    }
}

/// Banderas reportadas como YES/NO (geocerca, alertas)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "YES",
            YesNo::No => "NO",
        }
    }

    pub fn parse_stored(value: &str) -> Self {
        if value.eq_ignore_ascii_case("YES") {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

impl From<bool> for YesNo {
    fn from(flag: bool) -> Self {
        if flag {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

/// Valor escalar de un campo no mapeado. Los números se guardan con la
/// representación JSON original, sin pasar por `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl ExtraValue {
    /// Convertir un valor JSON crudo. `null` no aporta datos y se descarta;
    /// arrays y objetos se guardan con su codificación JSON.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(ExtraValue::Bool(*flag)),
            Value::Number(number) => Some(ExtraValue::Number(number.clone())),
            Value::String(text) => Some(ExtraValue::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => Some(ExtraValue::Text(value.to_string())),
        }
    }
}

/// Campos de la entrada que no tienen atributo propio en la lectura
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraFields(BTreeMap<String, ExtraValue>);

impl ExtraFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guardar un campo crudo tal cual llegó
    pub fn capture(&mut self, key: &str, value: &Value) {
        if let Some(extra) = ExtraValue::from_json(value) {
            self.0.insert(key.to_string(), extra);
        }
    }

    pub fn get(&self, key: &str) -> Option<&ExtraValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Atributos normalizados de una lectura, sin la referencia al vehículo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingFields {
    pub reg_no: String,
    /// Fecha canónica: última comunicación, si no último visto, si no hora de ingesta
    pub date: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_communication: Option<DateTime<Utc>>,
    pub position: Position,
    pub ignition: OnOff,
    pub ac: OnOff,
    pub camera: OnOff,
    pub geofence: YesNo,
    pub alert: YesNo,
    pub odometer: Option<Decimal>,
    pub speed: Option<f64>,
    pub distance: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub fuel_litres: Option<f64>,
    pub temperature_celsius: Option<f64>,
    pub today_working_ms: Option<i64>,
    pub driver: Option<String>,
    pub driver_mobile: Option<String>,
    pub nearest_location: Option<String>,
    pub duration: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub map_link: Option<String>,
    pub extra_fields: ExtraFields,
}

impl ReadingFields {
    /// Lectura vacía para una matrícula; los campos se rellenan al normalizar
    pub fn empty(reg_no: String, fetched_at: DateTime<Utc>) -> Self {
        Self {
            reg_no,
            date: fetched_at,
            last_seen: None,
            last_communication: None,
            position: Position::default(),
            ignition: OnOff::default(),
            ac: OnOff::default(),
            camera: OnOff::default(),
            geofence: YesNo::default(),
            alert: YesNo::default(),
            odometer: None,
            speed: None,
            distance: None,
            latitude: None,
            longitude: None,
            battery_voltage: None,
            fuel_litres: None,
            temperature_celsius: None,
            today_working_ms: None,
            driver: None,
            driver_mobile: None,
            nearest_location: None,
            duration: None,
            installation_date: None,
            expiry_date: None,
            map_link: None,
            extra_fields: ExtraFields::new(),
        }
    }
}

/// Lectura lista para persistir, ya asociada a su vehículo
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub vehicle_id: Uuid,
    pub fields: ReadingFields,
    /// Hora del ciclo que la produjo
    pub recorded_at: DateTime<Utc>,
}

/// Lectura persistida
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    #[serde(flatten)]
    pub fields: ReadingFields,
    pub created_at: DateTime<Utc>,
}

/// Filtros para listar lecturas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingFilters {
    pub reg_no: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl ReadingFilters {
    pub const DEFAULT_LIMIT: i64 = 200;
    pub const MAX_LIMIT: i64 = 1000;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Comprobar si una lectura cumple los filtros
    pub fn matches(&self, fields: &ReadingFields) -> bool {
        self.reg_no.as_deref().map_or(true, |reg_no| fields.reg_no == reg_no)
            && self.from.map_or(true, |from| fields.date >= from)
            && self.to.map_or(true, |to| fields.date <= to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_position_codes() {
        assert_eq!(Position::from_code("M"), Position::Moving);
        assert_eq!(Position::from_code("s"), Position::Stopped);
        assert_eq!(Position::from_code("P"), Position::Parked);
        assert_eq!(Position::from_code("Moving"), Position::Moving);
        assert_eq!(Position::from_code("X"), Position::Parked);
        assert_eq!(Position::from_code(""), Position::Parked);
    }

    #[test]
    fn test_extra_fields_serialize_as_plain_map() {
        let mut extras = ExtraFields::new();
        extras.capture("imei", &json!("356938035643809"));
        extras.capture("satellites", &json!(9));
        extras.capture("gpsFix", &json!(true));
        extras.capture("ignored", &Value::Null);
        extras.capture("tags", &json!(["a", "b"]));

        assert_eq!(extras.len(), 4);
        let encoded = serde_json::to_value(&extras).unwrap();
        assert_eq!(
            encoded,
            json!({
                "gpsFix": true,
                "imei": "356938035643809",
                "satellites": 9,
                "tags": "[\"a\",\"b\"]"
            })
        );

        let decoded: ExtraFields = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, extras);
    }

    #[test]
    fn test_large_integers_keep_every_digit() {
        let mut extras = ExtraFields::new();
        extras.capture("imei", &json!(12345678901234567891u64));
        extras.capture("ratio", &json!(0.1));

        let encoded = serde_json::to_string(&extras).unwrap();
        assert_eq!(encoded, r#"{"imei":12345678901234567891,"ratio":0.1}"#);

        let decoded: ExtraFields = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, extras);
    }

    #[test]
    fn test_reading_filters_limit_and_match() {
        let filters = ReadingFilters {
            reg_no: Some("DXB-1".to_string()),
            limit: Some(5000),
            ..Default::default()
        };
        assert_eq!(filters.effective_limit(), ReadingFilters::MAX_LIMIT);

        let fields = ReadingFields::empty("DXB-1".to_string(), Utc::now());
        assert!(filters.matches(&fields));

        let other = ReadingFields::empty("DXB-2".to_string(), Utc::now());
        assert!(!filters.matches(&other));
    }
}
