pub mod gateway;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod routes;

pub use gateway::create_app;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use middleware::security_headers_middleware;
pub use router::RequestRouter;
pub use routes::{Action, Resource, Route};
