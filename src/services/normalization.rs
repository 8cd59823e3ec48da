//! Normalización de entradas de telemetría
//!
//! Convierte cada objeto JSON del proveedor en una lectura canónica:
//! posición, banderas ON/OFF y YES/NO, marcas de tiempo, fechas, enlace al
//! mapa y campos extra. Todo campo que no tiene atributo propio (o cuyo valor
//! no se pudo interpretar) se guarda tal cual en `extra_fields`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::models::{OnOff, Position, ReadingFields, VehicleDescriptor, YesNo};
use crate::utils::errors::IngestionError;

/// Campos que pueden traer la matrícula, en orden de preferencia
pub const IDENTIFIER_KEYS: &[&str] = &["vehicleNo", "vehicle"];

/// Tokens de texto que encienden un interruptor ON/OFF
pub const SWITCH_TOKENS: &[&str] = &["true", "1"];

/// Tokens de texto que activan una bandera YES/NO
pub const AFFIRMATIVE_TOKENS: &[&str] = &["true", "1", "y", "yes"];

/// Formato principal de fecha-hora del proveedor
pub const PRIMARY_DATE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Formato de fecha del proveedor
pub const PRIMARY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Plantilla del enlace al mapa
pub const MAP_LINK_TEMPLATE: &str = "https://www.google.com/maps?q={lat},{lng}";

/// Formatos aceptados cuando falla el formato principal
const FALLBACK_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Vocabulario de salida de una bandera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagVocabulary {
    OnOff,
    YesNo,
}

/// Bandera booleana conocida: vocabulario de salida y tokens de texto aceptados.
/// JSON `true` y el número `1` son verdaderos en todas.
#[derive(Debug, Clone, Copy)]
pub struct FlagField {
    pub name: &'static str,
    pub vocabulary: FlagVocabulary,
    pub tokens: &'static [&'static str],
}

pub const FLAG_FIELDS: &[FlagField] = &[
    FlagField {
        name: "ignition",
        vocabulary: FlagVocabulary::OnOff,
        tokens: SWITCH_TOKENS,
    },
    FlagField {
        name: "ac",
        vocabulary: FlagVocabulary::OnOff,
        tokens: SWITCH_TOKENS,
    },
    FlagField {
        name: "camera",
        vocabulary: FlagVocabulary::OnOff,
        tokens: SWITCH_TOKENS,
    },
    FlagField {
        name: "geofence",
        vocabulary: FlagVocabulary::YesNo,
        tokens: AFFIRMATIVE_TOKENS,
    },
    FlagField {
        name: "alert",
        vocabulary: FlagVocabulary::YesNo,
        tokens: AFFIRMATIVE_TOKENS,
    },
];

/// Resultado de normalizar una entrada
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    pub license_plate: String,
    pub descriptor: VehicleDescriptor,
    pub fields: ReadingFields,
}

/// Normalizar una entrada cruda. Falla con `Validation` si la entrada no es
/// un objeto o no trae matrícula; el llamador debe omitirla.
pub fn normalize_entry(
    entry: &Value,
    fetched_at: DateTime<Utc>,
) -> Result<NormalizedEntry, IngestionError> {
    let object = entry
        .as_object()
        .ok_or_else(|| IngestionError::Validation("entry is not a JSON object".to_string()))?;

    let license_plate = vehicle_identifier(object).ok_or_else(|| {
        IngestionError::Validation("entry without vehicle identifier".to_string())
    })?;

    let mut descriptor = VehicleDescriptor::default();
    let mut fields = ReadingFields::empty(license_plate.clone(), fetched_at);

    for (key, value) in object {
        if IDENTIFIER_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(flag) = flag_field(key) {
            apply_flag(&mut fields, flag, value);
            continue;
        }
        if is_blank(value) && is_known_field(key) {
            continue;
        }

        let mapped = match key.as_str() {
            "vehicleName" => assign(&mut descriptor.vehicle_name, text(value)),
            "make" => assign(&mut descriptor.make, text(value)),
            "model" => assign(&mut descriptor.model, text(value)),
            "uom" => assign(&mut descriptor.uom, text(value)),
            "odometer" => {
                let odometer = decimal(value);
                descriptor.odometer = odometer;
                assign(&mut fields.odometer, odometer)
            }
            "position" => {
                fields.position = normalize_position(value);
                true
            }
            "lastSeen" => assign(
                &mut fields.last_seen,
                text(value).and_then(|raw| parse_date_time(&raw)),
            ),
            "lastComunicationTime" => {
                assign(&mut fields.last_communication, epoch_millis_to_utc(value))
            }
            "speed" => assign(&mut fields.speed, number(value)),
            "distance" => assign(&mut fields.distance, number(value)),
            "lat" => assign(&mut fields.latitude, number(value)),
            "lng" => assign(&mut fields.longitude, number(value)),
            "vehBattery" => assign(&mut fields.battery_voltage, number(value)),
            "fuelLtrs" => assign(&mut fields.fuel_litres, number(value)),
            "celsius" => assign(&mut fields.temperature_celsius, number(value)),
            "todayWorkingHours" => assign(&mut fields.today_working_ms, integer(value)),
            "driverName" => assign(&mut fields.driver, text(value)),
            "driverMobile" => assign(&mut fields.driver_mobile, text(value)),
            "location" => assign(&mut fields.nearest_location, text(value)),
            "duration" => assign(&mut fields.duration, text(value)),
            "installationDate" => assign(
                &mut fields.installation_date,
                text(value).and_then(|raw| parse_date(&raw)),
            ),
            "expiryDate" => assign(
                &mut fields.expiry_date,
                text(value).and_then(|raw| parse_date(&raw)),
            ),
            _ => false,
        };

        if !mapped {
            fields.extra_fields.capture(key, value);
        }
    }

    fields.map_link = map_link(object.get("lat"), object.get("lng"));
    fields.date = fields
        .last_communication
        .or(fields.last_seen)
        .unwrap_or(fetched_at);

    Ok(NormalizedEntry {
        license_plate,
        descriptor,
        fields,
    })
}

/// Campos con atributo propio en la lectura o en el vehículo
const KNOWN_FIELDS: &[&str] = &[
    "vehicleName",
    "make",
    "model",
    "uom",
    "odometer",
    "position",
    "lastSeen",
    "lastComunicationTime",
    "speed",
    "distance",
    "lat",
    "lng",
    "vehBattery",
    "fuelLtrs",
    "celsius",
    "todayWorkingHours",
    "driverName",
    "driverMobile",
    "location",
    "duration",
    "installationDate",
    "expiryDate",
];

fn is_known_field(key: &str) -> bool {
    KNOWN_FIELDS.contains(&key)
}

fn flag_field(key: &str) -> Option<&'static FlagField> {
    FLAG_FIELDS.iter().find(|flag| flag.name == key)
}

fn apply_flag(fields: &mut ReadingFields, field: &FlagField, value: &Value) {
    let flag = is_truthy(value, field.tokens);
    let key = field.name;
    match (key, field.vocabulary) {
        ("ignition", FlagVocabulary::OnOff) => fields.ignition = OnOff::from(flag),
        ("ac", FlagVocabulary::OnOff) => fields.ac = OnOff::from(flag),
        ("camera", FlagVocabulary::OnOff) => fields.camera = OnOff::from(flag),
        ("geofence", FlagVocabulary::YesNo) => fields.geofence = YesNo::from(flag),
        ("alert", FlagVocabulary::YesNo) => fields.alert = YesNo::from(flag),
        _ => fields.extra_fields.capture(key, value),
    }
}

fn assign<T>(slot: &mut Option<T>, parsed: Option<T>) -> bool {
    let mapped = parsed.is_some();
    *slot = parsed;
    mapped
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Primera matrícula no vacía de la entrada
pub fn vehicle_identifier(entry: &Map<String, Value>) -> Option<String> {
    IDENTIFIER_KEYS
        .iter()
        .filter_map(|key| entry.get(*key))
        .find_map(text)
}

/// Interpretar un token booleano heterogéneo
pub fn is_truthy(value: &Value, tokens: &[&str]) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64() == Some(1.0),
        Value::String(token) => {
            let token = token.trim().to_ascii_lowercase();
            tokens.contains(&token.as_str())
        }
        _ => false,
    }
}

/// Código de posición → estado canónico; lo desconocido es Parked
pub fn normalize_position(value: &Value) -> Position {
    match value {
        Value::String(code) => Position::from_code(code),
        _ => Position::Parked,
    }
}

/// Milisegundos desde epoch (número o texto numérico) → UTC
pub fn epoch_millis_to_utc(value: &Value) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(integer(value)?)
}

/// Fecha-hora textual: primero `DD-MM-YYYY HH:MM:SS`, luego formatos genéricos.
/// Las horas sin zona se interpretan como UTC.
pub fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, PRIMARY_DATE_TIME_FORMAT) {
        return Some(naive.and_utc());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    FALLBACK_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Fecha textual `DD-MM-YYYY` (o ISO) → fecha de calendario
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, PRIMARY_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Enlace al mapa cuando latitud y longitud están presentes y no vacías
pub fn map_link(lat: Option<&Value>, lng: Option<&Value>) -> Option<String> {
    let lat = coordinate_text(lat?)?;
    let lng = coordinate_text(lng?)?;
    Some(
        MAP_LINK_TEMPLATE
            .replace("{lat}", &lat)
            .replace("{lng}", &lng),
    )
}

fn coordinate_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|n| n.trunc() as i64)),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(|n| n.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}
