//! Rotaplan notification delivery worker.
//!
//! Polls the notification queue, claims pending rows and hands each one
//! to the configured sender. Claims hold for a lease, so rows stranded by
//! a crashed worker become claimable again once the lease expires. Failed
//! deliveries are recorded with a reason and left for operators to inspect.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rotaplan_application::{NotificationQueue, NotificationSender};
use rotaplan_core::{AppError, AppResult};
use rotaplan_infrastructure::{
    ConsoleNotificationSender, PostgresNotificationRepository, SmtpNotificationSender,
    SmtpSenderConfig,
};

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    claim_limit: usize,
    poll_interval_ms: u64,
    lease_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let queue = PostgresNotificationRepository::new(pool);
    let sender = build_sender()?;

    info!(
        claim_limit = config.claim_limit,
        poll_interval_ms = config.poll_interval_ms,
        lease_seconds = config.lease_seconds,
        "rotaplan-worker started"
    );

    loop {
        match queue
            .claim_pending(config.claim_limit, config.lease_seconds)
            .await
        {
            Ok(claimed) => {
                if claimed.is_empty() {
                    tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
                    continue;
                }

                info!(claimed_count = claimed.len(), "claimed notifications");

                for notification in claimed {
                    let notification_id = notification.id;

                    match sender.deliver(&notification).await {
                        Ok(()) => {
                            if let Err(error) = queue.mark_sent(notification_id).await {
                                warn!(
                                    %notification_id,
                                    error = %error,
                                    "failed to mark notification as sent"
                                );
                                continue;
                            }
                            info!(
                                %notification_id,
                                template = notification.template.as_str(),
                                "notification delivered"
                            );
                        }
                        Err(error) => {
                            warn!(
                                %notification_id,
                                error = %error,
                                "notification delivery failed"
                            );
                            let reason = error.to_string();
                            if let Err(error) =
                                queue.mark_failed(notification_id, reason.as_str()).await
                            {
                                warn!(
                                    %notification_id,
                                    error = %error,
                                    "failed to mark notification as failed"
                                );
                            }
                        }
                    }
                }
            }
            Err(error) => {
                warn!(error = %error, "failed to claim pending notifications");
                tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
            }
        }
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_sender() -> AppResult<Arc<dyn NotificationSender>> {
    let provider = env::var("NOTIFICATION_PROVIDER").unwrap_or_else(|_| "console".to_owned());

    match provider.as_str() {
        "console" => Ok(Arc::new(ConsoleNotificationSender::new())),
        "smtp" => {
            let smtp_port = match env::var("SMTP_PORT") {
                Ok(value) => value.parse::<u16>().map_err(|error| {
                    AppError::Validation(format!("invalid SMTP_PORT value '{value}': {error}"))
                })?,
                Err(_) => 587,
            };
            Ok(Arc::new(SmtpNotificationSender::new(SmtpSenderConfig {
                host: required_env("SMTP_HOST")?,
                port: smtp_port,
                username: required_env("SMTP_USERNAME")?,
                password: required_env("SMTP_PASSWORD")?,
                from_address: required_env("SMTP_FROM_ADDRESS")?,
            })))
        }
        other => Err(AppError::Validation(format!(
            "NOTIFICATION_PROVIDER must be 'console' or 'smtp', got '{other}'"
        ))),
    }
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let claim_limit = parse_env_usize("WORKER_CLAIM_LIMIT", 10)?;
        let poll_interval_ms = parse_env_u64("WORKER_POLL_INTERVAL_MS", 1500)?;
        let lease_seconds = parse_env_u64("WORKER_LEASE_SECONDS", 60)?;

        if claim_limit == 0 {
            return Err(AppError::Validation(
                "WORKER_CLAIM_LIMIT must be greater than zero".to_owned(),
            ));
        }

        if poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "WORKER_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        if lease_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_LEASE_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            claim_limit,
            poll_interval_ms,
            lease_seconds,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_usize(name: &str, default: usize) -> AppResult<usize> {
    match env::var(name) {
        Ok(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
