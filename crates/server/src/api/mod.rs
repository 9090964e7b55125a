pub mod downloads;
pub mod files;
pub mod handlers;
pub mod routes;
pub mod video_info;

pub use routes::create_router;
