use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tonic::transport::Server;
use tracing_subscriber::EnvFilter;

use mahjong_handle_engine::bank::HandBank;
use mahjong_handle_engine::engine::models::RuleVariant;
use mahjong_handle_engine::rules::{default_registry, RuleTables};
use mahjong_handle_engine::server::proto::handle_service_server::HandleServiceServer;
use mahjong_handle_engine::server::HandleServer;
use mahjong_handle_engine::store::{CacheStore, MemoryStore, SessionStore};

#[derive(Parser)]
#[command(name = "mahjong-handle-engine", about = "Mahjong hand-guessing puzzle gRPC server")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "50051", env = "HANDLE_ENGINE_PORT")]
    port: u16,

    /// Path to the hand bank file
    #[arg(long, default_value = "hands.txt", env = "HANDLE_BANK_PATH")]
    bank: PathBuf,

    /// Path to a rule_tables.toml overriding the built-in display tables
    #[arg(long, env = "HANDLE_RULE_TABLES")]
    tables: Option<PathBuf>,

    /// Session store backend: "memory" or "cache"
    #[arg(long, default_value = "memory", env = "HANDLE_STORE")]
    store: String,

    /// Session time-to-live in seconds
    #[arg(long, default_value = "86400", env = "HANDLE_SESSION_TTL_SECONDS")]
    ttl_seconds: u64,

    /// Attempt budget used when a request does not supply one
    #[arg(long, default_value = "8", env = "HANDLE_ATTEMPT_BUDGET")]
    attempt_budget: u32,

    /// Rule variant used when a request does not supply one
    #[arg(long, default_value = "riichi", env = "HANDLE_RULE_VARIANT")]
    rule_variant: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let bank = HandBank::load(&cli.bank)?;
    tracing::info!(path = %cli.bank.display(), hands = bank.len(), "hand bank loaded");

    let tables = match &cli.tables {
        Some(path) => {
            let tables = RuleTables::load(path)?;
            tracing::info!(path = %path.display(), "rule tables loaded");
            tables
        }
        None => RuleTables::builtin().clone(),
    };

    let default_variant = RuleVariant::parse(&cli.rule_variant)
        .ok_or_else(|| format!("unknown rule variant: {}", cli.rule_variant))?;

    let registry = default_registry();
    tracing::info!(
        variants = ?registry.variants().iter().map(|v| v.as_str()).collect::<Vec<_>>(),
        "registered hand evaluators"
    );

    let store: Arc<dyn SessionStore> = match cli.store.as_str() {
        "memory" => Arc::new(MemoryStore::new(cli.ttl_seconds)),
        "cache" => Arc::new(CacheStore::new(cli.ttl_seconds, "mh:v1:session:")),
        other => return Err(format!("unknown store backend: {other}").into()),
    };
    tracing::info!(store = store.store_type(), ttl_seconds = cli.ttl_seconds, "session store ready");

    let server = HandleServer::new(
        store,
        Arc::new(registry),
        Arc::new(bank),
        Arc::new(tables),
        cli.attempt_budget,
        default_variant,
    );

    let addr: SocketAddr = ([0, 0, 0, 0], cli.port).into();
    tracing::info!(%addr, "starting gRPC server");

    Server::builder()
        .add_service(HandleServiceServer::new(server))
        .serve(addr)
        .await?;

    Ok(())
}
