use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;
use vitrina_store_json::ModelStore;

use crate::handlers;
use crate::middleware::{access_log, annotate_request};

#[derive(Clone)]
pub struct ServiceState {
    pub store: Arc<dyn ModelStore>,
    pub report_path: PathBuf,
    pub access_log_path: PathBuf,
}

/// Builds the full router.
///
/// The three single-record routes share one path segment (`:clave`); the
/// handler decides whether it means `Patreon`, `Nombre_Modelo`, or `id`.
/// `/modelos/actualizar` is a static sibling and wins the match. Both
/// middlewares cover the whole file-based route set; the annotation layer
/// is method-aware, so only POST gets `created_at` and only PUT gets
/// `updated_at`.
pub fn app(state: ServiceState) -> Router {
    let modelos = Router::new()
        .route(
            "/modelos",
            get(handlers::list_modelos).post(handlers::create_modelo),
        )
        .route("/modelos/actualizar", put(handlers::bulk_update_field))
        .route(
            "/modelos/:clave",
            get(handlers::get_modelo_by_patreon)
                .put(handlers::update_modelo_by_nombre)
                .delete(handlers::delete_modelo_by_id),
        )
        .layer(axum::middleware::from_fn(annotate_request))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            access_log,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1/file", modelos)
        .with_state(state)
}
