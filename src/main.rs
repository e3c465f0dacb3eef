use tracing_subscriber::EnvFilter;

use ecclesia_api::state::AppState;
use ecclesia_api::{app, config, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config::config();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting Ecclesia API in {:?} mode", config.environment);

    // Lazy pool: the public surface boots even while the database is down.
    let pool = database::connect_lazy(&config.database)?;
    let state = AppState::new(pool.clone());

    // Bootstrap poll for an existing session; converges on the same state
    // update path as live sign-ins.
    tokio::spawn(state.session_store.clone().bootstrap(pool));

    // Audit line per session transition; the subscription is released when
    // the task is dropped at shutdown.
    let mut session_watch = state.session_store.subscribe();
    tokio::spawn(async move {
        while session_watch.changed().await.is_ok() {
            match session_watch.current().identity {
                Some(identity) => tracing::info!("Session active for {}", identity.email),
                None => tracing::info!("Session cleared"),
            }
        }
    });

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("Ecclesia API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
