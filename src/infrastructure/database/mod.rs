pub mod entities;
pub mod migrator;
pub mod repositories;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::shared::{retry_with_backoff, RetryConfig};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./eventhub.db?mode=rwc")
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./eventhub.db?mode=rwc".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            ..Default::default()
        }
    }

    fn connect_options(&self) -> ConnectOptions {
        let mut opts = ConnectOptions::new(self.url.clone());
        opts.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .sqlx_logging(false);
        opts
    }
}

/// Connect to the database, retrying transient failures with backoff.
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", redact(&config.url));
    let opts = config.connect_options();
    let db = retry_with_backoff(
        RetryConfig::default(),
        || Database::connect(opts.clone()),
        |_| true,
        "connect_database",
    )
    .await?;
    info!("Database connected successfully");
    Ok(db)
}

/// Hide the password part of a connection URL.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let creds = &url[scheme_end + 3..at];
            match creds.split_once(':') {
                Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::MigratorTrait;

    #[test]
    fn password_is_redacted() {
        assert_eq!(
            redact("postgres://app:hunter2@db:5432/events"),
            "postgres://app:***@db:5432/events"
        );
        assert_eq!(redact("sqlite://./eventhub.db?mode=rwc"), "sqlite://./eventhub.db?mode=rwc");
    }

    #[tokio::test]
    async fn migrations_apply_to_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let config = DatabaseConfig::sqlite(path.to_str().unwrap());

        let db = init_database(&config).await.unwrap();
        migrator::Migrator::up(&db, None).await.unwrap();
        // Re-running is a no-op.
        migrator::Migrator::up(&db, None).await.unwrap();
        assert!(path.exists());
    }
}
