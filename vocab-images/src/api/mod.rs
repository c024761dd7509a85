//! HTTP API handlers for vocab-images

pub mod health;
pub mod images;

pub use health::health_routes;
pub use images::image_routes;
