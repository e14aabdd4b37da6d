use lectern_common::database;

use crate::infrastructure::AppStateImpl;
use crate::infrastructure::http::{HttpServer, HttpServerConfig};
use crate::infrastructure::persistence::PostgresCourseRepository;
use crate::infrastructure::settings::Settings;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod domain;
mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = database::connect(&settings.database).await?;
    tracing::info!(
        "connected to {}/{} (schema {})",
        settings.database.host,
        settings.database.db,
        database.database_schema()
    );

    let repository = PostgresCourseRepository::new(database);
    let state = AppStateImpl::new(repository);

    let server_config = HttpServerConfig {
        port: &settings.server_port,
        user_header: &settings.identity.user_header,
        role_header: &settings.identity.role_header,
        request_timeout: settings.request_timeout(),
    };
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
