//! hashmodel demo binary
//!
//! Registers a `Profile` model, then runs one save / list / get / remove
//! cycle against the selected backend.

use std::sync::Arc;

use clap::{ArgAction, Parser, ValueEnum};
use hashmodel::{Engine, EngineConfig, Filters, MemoryStore, Model, RecordId, StoreConfig};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-process store, nothing to connect to
    Memory,
    /// Redis server at --host / --port
    Redis,
}

/// hashmodel demo
#[derive(Parser, Debug)]
#[command(name = "hashmodel-demo")]
#[command(about = "Save, list, fetch and remove a record through hashmodel")]
#[command(version)]
struct Args {
    /// Store backend
    #[arg(long, value_enum, default_value = "memory", env = "HASHMODEL_BACKEND")]
    backend: Backend,

    /// Redis host
    #[arg(long, default_value = "localhost", env = "HASHMODEL_HOST")]
    host: String,

    /// Redis port
    #[arg(long, default_value_t = 6379, env = "HASHMODEL_PORT")]
    port: u16,

    /// Redis password
    #[arg(long, env = "HASHMODEL_PASSWORD")]
    password: Option<String>,

    /// Keep the connection alive between requests
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "HASHMODEL_KEEP_ALIVE")]
    keep_alive: bool,

    /// Redis database index
    #[arg(long, default_value_t = 0, env = "HASHMODEL_DATABASE")]
    database: i64,

    /// Storage key prefix
    #[arg(long, default_value = "db", env = "HASHMODEL_PREFIX")]
    prefix: String,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            store: StoreConfig {
                host: self.host.clone(),
                port: self.port,
                password: self.password.clone(),
                keep_alive: self.keep_alive,
                database: self.database,
            },
            prefix: self.prefix.clone(),
            ..EngineConfig::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Profile {
    #[serde(skip)]
    id: Option<RecordId>,
    title: String,
    email: String,
    password: String,
}

impl Model for Profile {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
}

async fn open(args: &Args) -> anyhow::Result<Engine> {
    let config = args.engine_config();
    match args.backend {
        Backend::Memory => Ok(Engine::new(config, Arc::new(MemoryStore::new()))),
        #[cfg(feature = "redis")]
        Backend::Redis => Ok(Engine::connect(config).await?),
        #[cfg(not(feature = "redis"))]
        Backend::Redis => anyhow::bail!("built without the `redis` feature"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hashmodel=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    tracing::info!(backend = ?args.backend, prefix = %args.prefix, "starting demo");

    let engine = open(&args).await?;
    let profiles = engine.register::<Profile>();

    let had_records = profiles.clear(&Filters::all()).await?;
    tracing::info!(had_records, "collection cleared");

    let mut profile = Profile {
        id: None,
        title: "Alex".to_string(),
        email: "test@test.ru".to_string(),
        password: "testingpas".to_string(),
    };
    let outcome = profiles.save(&mut profile).await?;
    tracing::info!(id = %outcome.id(), "profile saved");

    let query = profiles.find(&Filters::all()).await?;
    for record in query.get_all().await? {
        tracing::info!(id = ?record.id(), title = %record.title, email = %record.email, "listed");
    }

    match profiles.get(outcome.id()).await? {
        Some(fetched) => tracing::info!(title = %fetched.title, "fetched by id"),
        None => tracing::warn!(id = %outcome.id(), "saved profile not found"),
    }

    let removed = profiles.remove(&profile).await?;
    let remaining = profiles.count().await?;
    tracing::info!(removed, remaining, "profile removed");

    Ok(())
}
