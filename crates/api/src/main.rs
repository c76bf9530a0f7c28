use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adviser_core::catalog::{PlatformCatalog, PlatformProfile};
use adviser_core::domain::profile::{ProfileValidationError, RecommendationRequest};
use adviser_core::domain::recommendation::RecommendationResult;
use adviser_core::engine::{RecommendationEngine, RecommendationService};
use adviser_core::model::remote::HttpJsonModel;
use adviser_core::model::SuccessModel;
use adviser_core::storage::cache::{PostgresResultCache, ResultCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = adviser_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let cache: Option<Arc<dyn ResultCache>> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match adviser_core::storage::migrate(&pool).await {
                Ok(()) => Some(Arc::new(PostgresResultCache::new(pool))),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API without result cache");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API without result cache");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; starting API without result cache");
            None
        }
    };

    let model: Option<Arc<dyn SuccessModel>> = if settings.model_base_url.is_some() {
        match HttpJsonModel::from_settings(&settings) {
            Ok(model) => {
                tracing::info!(model = model.model_name(), "remote success model configured");
                Some(Arc::new(model))
            }
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "model client init failed; using heuristic scoring");
                None
            }
        }
    } else {
        None
    };

    let catalog = Arc::new(PlatformCatalog::builtin());
    let engine = RecommendationEngine::new(Arc::clone(&catalog), model);
    let mut service = RecommendationService::new(engine, cache);
    if let Some(ttl_secs) = settings.cache_ttl_secs {
        service = service.with_cache_ttl(ttl_secs);
    }

    let state = AppState {
        catalog,
        service: Arc::new(service),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/recommendations", post(post_recommendations))
        .route("/api/platforms", get(get_platforms))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    catalog: Arc<PlatformCatalog>,
    service: Arc<RecommendationService>,
}

async fn post_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResult>, (StatusCode, Json<serde_json::Value>)> {
    let mut rng = StdRng::from_entropy();

    match state.service.recommend(&request, &mut rng).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            if let Some(validation) = err.downcast_ref::<ProfileValidationError>() {
                return Err((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({ "error": validation.to_string() })),
                ));
            }

            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "recommendation computation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "internal error" })),
            ))
        }
    }
}

#[derive(Debug, Serialize)]
struct PlatformListing {
    platforms: Vec<PlatformEntry>,
}

#[derive(Debug, Serialize)]
struct PlatformEntry {
    name: String,
    features: PlatformProfile,
}

async fn get_platforms(State(state): State<AppState>) -> Json<PlatformListing> {
    let platforms = state
        .catalog
        .platforms()
        .map(|(name, features)| PlatformEntry {
            name: name.to_string(),
            features: features.clone(),
        })
        .collect();

    Json(PlatformListing { platforms })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &adviser_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
