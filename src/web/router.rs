//! Web application router and middleware setup.

use crate::monitor::registry::SessionRegistry;
use crate::web::config::WebConfig;
use crate::web::handlers;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the axum application with all routes and middleware.
pub fn create_app(registry: Arc<SessionRegistry>, config: &WebConfig) -> Router {
    let mut app = Router::new()
        // Control endpoints
        .route("/start", get(handlers::start_monitoring))
        .route("/stop", get(handlers::stop_monitoring))
        // API routes
        .route("/api/status", get(handlers::get_status))
        .route("/api/health", get(handlers::health_check))
        .with_state(registry);

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::monitor::registry::SensorFactory;
    use crate::mqtt::publisher::RecordingPublisher;
    use crate::sensor::DefaultSensor;

    #[tokio::test]
    async fn test_create_app() {
        let factory: SensorFactory = Arc::new(|| {
            let sensor = DefaultSensor::new()?;
            Ok(Box::new(sensor) as _)
        });
        let registry = Arc::new(SessionRegistry::new(
            MonitorConfig::new("gh-test", "localhost"),
            factory,
            Arc::new(RecordingPublisher::new()),
        ));
        let _app = create_app(registry, &WebConfig::default());
    }
}
