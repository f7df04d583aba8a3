use actix_web::{middleware::Logger, App, HttpServer};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::comm::config::get_global_config_manager;
use crate::comm::port::{available_port, is_port_available_sync};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::bootstrap::route_registry::{configure_global_routes, global_routes_stats};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            workers: Some(8),
            debug: false,
        }
    }
}

/// Application bootstrap: logging, database pool, HTTP server.
pub struct AppBootstrap {
    config: Option<AppConfig>,
}

impl AppBootstrap {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub async fn run(self) -> AppResult<()> {
        let config = self.config.clone().unwrap_or_default();

        let config_manager = get_global_config_manager()?;

        // Logging: env filter + bunyan JSON layer.
        let default_level = config_manager.get_or("logging.level", "info".to_string());
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let formatting_layer = BunyanFormattingLayer::new("bhxh-portal".into(), std::io::stdout);
        let subscriber = Registry::default()
            .with(env_filter)
            .with(JsonStorageLayer)
            .with(formatting_layer);
        // Tests may have installed a subscriber already.
        let _ = tracing::subscriber::set_global_default(subscriber);

        info!("Khởi động máy chủ, cấu hình: {:?}", config);

        self.init_pool_with_retry().await?;

        let server_port = if is_port_available_sync(config.port) {
            config.port
        } else {
            warn!("Cổng {} đang bận, tìm cổng khác...", config.port);
            available_port(config.port)
        };

        let (route_count, modules) = global_routes_stats();
        info!(
            "Đã đăng ký {} nhóm route từ các module {:?}",
            route_count, modules
        );

        match self.start_http_server(config, server_port).await {
            Ok(_) => {
                info!("Máy chủ đã dừng");
                Ok(())
            }
            Err(e) => {
                error!("Khởi động máy chủ thất bại: {}", e);
                Err(e)
            }
        }
    }

    /// Connect the database pool, retrying with exponential backoff so a
    /// briefly unavailable database does not kill the deployment.
    async fn init_pool_with_retry(&self) -> AppResult<()> {
        const MAX_RETRIES: u32 = 3;

        let config_manager = get_global_config_manager()?;
        let url = config_manager.get_string("database.url")?;
        let max_connections = config_manager.get_or("database.max_connections", 10u32);

        for attempt in 1..=MAX_RETRIES {
            info!("Kết nối cơ sở dữ liệu, lần thử {}/{}", attempt, MAX_RETRIES);

            match db::init_pool(&url, max_connections).await {
                Ok(_) => {
                    info!("Kết nối cơ sở dữ liệu thành công");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Kết nối thất bại (lần {}): {}", attempt, e);
                    if attempt == MAX_RETRIES {
                        return Err(AppError::database(e.to_string()));
                    }
                }
            }

            let delay = Duration::from_millis(1000 * 2_u64.pow(attempt - 1));
            sleep(delay).await;
        }

        unreachable!()
    }

    async fn start_http_server(&self, config: AppConfig, server_port: u16) -> AppResult<()> {
        let mut server = HttpServer::new(move || {
            App::new()
                .wrap(Logger::default())
                .configure(configure_global_routes)
        });
        if let Some(workers) = config.workers {
            server = server.workers(workers);
        }

        server
            .bind(format!("{}:{}", config.host, server_port))
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?
            .run()
            .await
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        Ok(())
    }
}

impl Default for AppBootstrap {
    fn default() -> Self {
        Self::new()
    }
}
