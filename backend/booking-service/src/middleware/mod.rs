pub mod jwt_auth;
pub mod metrics;
pub mod permissions;

pub use jwt_auth::{AuthUser, JwtAuthMiddleware};
pub use metrics::MetricsMiddleware;
