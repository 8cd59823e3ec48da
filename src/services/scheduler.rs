//! Scheduler de ingesta
//!
//! Cada tick consulta el gate de frecuencia y, si toca, ejecuta un ciclo del
//! pipeline. Un mutex en proceso evita que dos ticks se solapen.

use std::sync::Arc;

use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::models::IngestionOutcome;
use crate::repositories::SettingsStore;
use crate::services::ingestion_service::{load_settings, IngestionPipeline};
use crate::services::scheduling_gate::{GateDecision, SchedulingGate};

/// Resultado de un tick del scheduler
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TickResult {
    Ran { outcome: IngestionOutcome },
    NotDue { remaining_seconds: i64 },
    /// Ya hay un ciclo en curso en este proceso
    Busy,
    /// No se pudo decidir si tocaba ejecutar
    Failed { message: String },
}

pub struct IngestionScheduler {
    settings: Arc<dyn SettingsStore>,
    gate: SchedulingGate,
    pipeline: IngestionPipeline,
    running: Mutex<()>,
}

impl IngestionScheduler {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        gate: SchedulingGate,
        pipeline: IngestionPipeline,
    ) -> Self {
        Self {
            settings,
            gate,
            pipeline,
            running: Mutex::new(()),
        }
    }

    /// Ejecutar el tick en su propia tarea. El ciclo termina, se registra
    /// y actualiza el gate aunque quien lo pidió deje de esperar.
    pub fn spawn_tick(self: &Arc<Self>, force: bool) -> JoinHandle<TickResult> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.tick(force).await })
    }

    /// `force` omite el gate; la ejecución se registra igualmente.
    pub async fn tick(&self, force: bool) -> TickResult {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("⏳ Ciclo de ingesta en curso, tick omitido");
            return TickResult::Busy;
        };

        if !force {
            let settings = match load_settings(self.settings.as_ref()).await {
                Ok(settings) => settings,
                Err(e) => {
                    error!("❌ {}: {}", e.title(), e);
                    return TickResult::Failed {
                        message: e.to_string(),
                    };
                }
            };

            match self.gate.check(settings.frequency_minutes).await {
                Ok(GateDecision::Due) => {}
                Ok(GateDecision::NotDue { remaining }) => {
                    debug!("⏱️ Próximo ciclo en {}s", remaining.num_seconds());
                    return TickResult::NotDue {
                        remaining_seconds: remaining.num_seconds(),
                    };
                }
                Err(e) => {
                    error!("❌ {}: {}", e.title(), e);
                    return TickResult::Failed {
                        message: e.to_string(),
                    };
                }
            }
        } else {
            info!("⚡ Ciclo de ingesta forzado");
        }

        let outcome = self.pipeline.run().await;

        match self.gate.mark_run().await {
            Ok(at) => debug!("💾 Última ejecución registrada: {}", at),
            Err(e) => warn!("⚠️ {}: {}", e.title(), e),
        }

        TickResult::Ran { outcome }
    }
}
