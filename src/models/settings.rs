//! Configuración persistida de la integración con el proveedor de telemetría

use std::fmt;

use serde::Serialize;
use sqlx::FromRow;
use validator::Validate;

/// Fila única de `tracking_settings`
#[derive(Clone, Serialize, FromRow, Validate)]
pub struct TrackingSettings {
    #[validate(url)]
    pub base_url: String,

    #[validate(length(min = 1))]
    pub provider_name: String,

    #[serde(skip_serializing)]
    #[validate(length(min = 1))]
    pub token: String,

    #[validate(range(min = 0.0))]
    pub frequency_minutes: f64,
}

impl fmt::Debug for TrackingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingSettings")
            .field("base_url", &self.base_url)
            .field("provider_name", &self.provider_name)
            .field("token", &"***")
            .field("frequency_minutes", &self.frequency_minutes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TrackingSettings {
        TrackingSettings {
            base_url: "https://telemetry.example.com/api/vehicles".to_string(),
            provider_name: "erpgulf".to_string(),
            token: "secret-token".to_string(),
            frequency_minutes: 5.0,
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn test_missing_token_is_invalid() {
        let mut settings = settings();
        settings.token = String::new();
        let errors = settings.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("token"));
    }

    #[test]
    fn test_debug_masks_token() {
        let rendered = format!("{:?}", settings());
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("***"));
    }
}
