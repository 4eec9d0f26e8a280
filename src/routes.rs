use axum::{
    error_handling::HandleErrorLayer,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::{
    timeout::{error::Elapsed, TimeoutLayer},
    BoxError, ServiceBuilder,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{Brand, CatalogStore, Category, Entity, Food, FoodType, Readiness};
use crate::config::{AppConfig, ConfigError};
use crate::error::ApiError;
use crate::handlers::{catalog, system, Resource};
use crate::identity::IdentityProvider;
use crate::middleware::{authenticate, Gateway};

const CORS_MAX_AGE: Duration = Duration::from_secs(300);

/// Everything the router needs from the outside world.
#[derive(Clone)]
pub struct AppState {
    pub categories: Arc<dyn CatalogStore<Category>>,
    pub brands: Arc<dyn CatalogStore<Brand>>,
    pub food_types: Arc<dyn CatalogStore<FoodType>>,
    pub foods: Arc<dyn CatalogStore<Food>>,
    pub readiness: Arc<dyn Readiness>,
    pub identity: Arc<dyn IdentityProvider>,
}

pub fn app(state: AppState, config: &AppConfig) -> Result<Router, ConfigError> {
    let gateway = Gateway::new(
        state.identity,
        Duration::from_secs(config.auth.cache_ttl_secs),
    );
    let max_page_size = config.pagination.max_page_size;

    let system = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .with_state(state.readiness);

    let router = Router::new()
        .merge(system)
        .nest(
            "/api/v1/categories",
            resource_routes(Resource::new(state.categories, max_page_size), gateway.clone()),
        )
        .nest(
            "/api/v1/brands",
            resource_routes(Resource::new(state.brands, max_page_size), gateway.clone()),
        )
        .nest(
            "/api/v1/foodtypes",
            resource_routes(Resource::new(state.food_types, max_page_size), gateway.clone()),
        )
        .nest(
            "/api/v1/foods",
            resource_routes(Resource::new(state.foods, max_page_size), gateway),
        )
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(request_failed))
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors.allowed_origin)?);

    Ok(router)
}

/// `/list`, `/` and `/:id` for one entity, all behind the gateway.
pub fn resource_routes<E: Entity>(resource: Resource<E>, gateway: Gateway) -> Router {
    Router::new()
        .route("/list", get(catalog::list::<E>))
        .route("/", post(catalog::create::<E>))
        .route(
            "/:id",
            get(catalog::get_one::<E>)
                .put(catalog::edit::<E>)
                .delete(catalog::delete::<E>),
        )
        .route_layer(middleware::from_fn_with_state(gateway, authenticate))
        .with_state(resource)
}

/// Turns a request deadline into a JSON `DEADLINE_EXCEEDED` response.
async fn request_failed(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request exceeded the server deadline");
        return ApiError::deadline_exceeded("The request took too long to complete");
    }

    tracing::error!("Request failed in middleware: {}", err);
    ApiError::internal_server_error("An error occurred while processing your request")
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(allowed_origin).map_err(|_| ConfigError::Invalid {
        name: "CORS_ALLOWED_ORIGIN",
        value: allowed_origin.to_string(),
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE))
}
