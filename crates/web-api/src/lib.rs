//! Web API 层。
//!
//! 提供 Axum 路由：受访问控制保护的实体资源接口，以及公开的健康检查接口。

mod auth;
mod error;
mod health;
mod resources;
mod routes;
mod state;

pub use auth::{authorize, AccessGate, JwtService};
pub use error::{ApiError, ErrorBody};
pub use resources::entity_routes;
pub use routes::router;
pub use state::{AppState, Repositories};
