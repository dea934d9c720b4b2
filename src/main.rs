use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perfume_storefront::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    models::SiteSettings,
    routes::build_app,
    services::settings_service,
    session::{self, SESSION_CLEANUP_INTERVAL},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,perfume_storefront=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let settings = settings_service::load_or_init(&orm).await?;
    tracing::info!(site = %settings.site_name, currency = %settings.currency, "site settings loaded");

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let state = AppState::new(orm, config, SiteSettings::from(settings));
    tokio::spawn(session::run_cleanup(
        state.sessions.clone(),
        SESSION_CLEANUP_INTERVAL,
    ));
    let app = build_app(state);

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
