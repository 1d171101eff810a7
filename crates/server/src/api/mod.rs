pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod shipments;
pub mod status_updates;

pub use routes::create_router;
