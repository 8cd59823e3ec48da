//! Gate de frecuencia
//!
//! Decide si toca ejecutar un ciclo de ingesta comparando la hora actual con
//! la última ejecución registrada y la frecuencia configurada en minutos.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use tracing::debug;

use crate::utils::errors::IngestionError;

/// Almacén compartido de la hora de la última ejecución
#[async_trait]
pub trait LastRunStore: Send + Sync {
    async fn last_run(&self) -> Result<Option<DateTime<Utc>>, IngestionError>;
    async fn record_run(&self, at: DateTime<Utc>) -> Result<(), IngestionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Due,
    NotDue { remaining: Duration },
}

impl GateDecision {
    pub fn is_due(&self) -> bool {
        matches!(self, GateDecision::Due)
    }
}

/// Sin última ejecución siempre toca. Con frecuencia 0 (o negativa) toca en
/// cada tick.
pub fn evaluate(
    now: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
    frequency_minutes: f64,
) -> GateDecision {
    let Some(last_run) = last_run else {
        return GateDecision::Due;
    };

    let interval_ms = (frequency_minutes.max(0.0) * 60_000.0).round() as i64;
    let interval = Duration::milliseconds(interval_ms);
    let elapsed = now - last_run;

    if elapsed >= interval {
        GateDecision::Due
    } else {
        GateDecision::NotDue {
            remaining: interval - elapsed,
        }
    }
}

pub struct SchedulingGate {
    store: Arc<dyn LastRunStore>,
    clock: Arc<dyn Clock>,
}

impl SchedulingGate {
    pub fn new(store: Arc<dyn LastRunStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn check(&self, frequency_minutes: f64) -> Result<GateDecision, IngestionError> {
        let last_run = self.store.last_run().await?;
        let decision = evaluate(self.clock.utc(), last_run, frequency_minutes);
        debug!(
            "⏱️ Gate: última ejecución {:?}, frecuencia {} min → {:?}",
            last_run, frequency_minutes, decision
        );
        Ok(decision)
    }

    /// Registrar la ejecución con la hora actual del reloj
    pub async fn mark_run(&self) -> Result<DateTime<Utc>, IngestionError> {
        let now = self.clock.utc();
        self.store.record_run(now).await?;
        Ok(now)
    }
}
