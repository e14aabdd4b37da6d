use crate::{
    domain::{course_tables, migration::Migration},
    infrastructure::{persistence::PersistenceAdapter, settings::Settings},
};
use lectern_common::database;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod domain;
pub mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = database::connect(&settings.database).await?;
    tracing::info!("connected to {}/{}", settings.database.host, settings.database.db);
    let persistence = PersistenceAdapter::new(database);

    // create the course schema tables that are still missing
    let migration = Migration::new(course_tables(), persistence);
    let created = migration.migrate().await?;
    tracing::info!("schema migrated, {} table(s) created", created);

    Ok(())
}
