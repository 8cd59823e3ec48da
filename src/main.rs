use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use mockable::{Clock, DefaultClock};
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vehicle_tracker::cache::{CacheConfig, RedisClient};
use vehicle_tracker::clients::TelemetryHttpClient;
use vehicle_tracker::config::{DatabaseConfig, EnvironmentConfig};
use vehicle_tracker::database;
use vehicle_tracker::repositories::{
    ReadingRepository, RunLogRepository, SettingsRepository, VehicleRepository,
};
use vehicle_tracker::routes::create_router;
use vehicle_tracker::services::{
    IngestionPipeline, IngestionScheduler, RegistryResolver, SchedulingGate, TickResult,
};
use vehicle_tracker::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚚 Vehicle Tracker - Ingesta de telemetría");
    info!("==========================================");

    let config = EnvironmentConfig::from_env()?;
    info!(
        "⚙️ Entorno: {} | tick: {}s | timeout proveedor: {}s | política: {}",
        config.environment,
        config.scheduler_tick_secs,
        config.telemetry_timeout_secs,
        config.vehicle_attribute_policy
    );

    // Inicializar base de datos
    let pool = match database::connect(&DatabaseConfig::from_env()?).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Inicializar Redis (estado compartido del scheduler)
    let redis_client = match RedisClient::new(CacheConfig::from_env()).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Error conectando a Redis: {}", e);
            return Err(anyhow::anyhow!("Error de Redis: {}", e));
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let settings = Arc::new(SettingsRepository::new(pool.clone()));
    let vehicles = Arc::new(VehicleRepository::new(pool.clone()));
    let readings = Arc::new(ReadingRepository::new(pool.clone()));
    let runs = Arc::new(RunLogRepository::new(pool));
    let source = Arc::new(TelemetryHttpClient::new(config.telemetry_timeout())?);

    let pipeline = IngestionPipeline::new(
        settings.clone(),
        source,
        RegistryResolver::new(vehicles.clone(), config.vehicle_attribute_policy),
        readings.clone(),
        runs.clone(),
        clock.clone(),
    );
    let gate = SchedulingGate::new(Arc::new(redis_client), clock);
    let scheduler = Arc::new(IngestionScheduler::new(settings, gate, pipeline));

    let ticker = tokio::spawn(run_scheduler(scheduler.clone(), config.scheduler_tick()));

    let app_state = AppState::new(config.clone(), scheduler, vehicles, readings, runs);
    let app = create_router(app_state);

    let addr: SocketAddr = config.server_url().parse()?;
    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   POST /api/ingestion/run - Ejecutar ciclo de ingesta");
    info!("   GET  /api/ingestion/runs - Ciclos recientes");
    info!("   GET  /api/vehicles - Listar vehículos");
    info!("   GET  /api/readings - Listar lecturas");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Servidor terminó con error: {}", e);
    }

    ticker.abort();
    info!("👋 Servidor terminado");
    Ok(())
}

/// Despertar el scheduler a intervalos fijos; los ticks atrasados se descartan
async fn run_scheduler(scheduler: Arc<IngestionScheduler>, every: std::time::Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        match scheduler.tick(false).await {
            TickResult::Ran { outcome } if !outcome.is_success() => {
                warn!("⚠️ Ciclo terminado con error: {:?}", outcome.message);
            }
            TickResult::Failed { message } => {
                warn!("⚠️ Tick omitido: {}", message);
            }
            _ => {}
        }
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
