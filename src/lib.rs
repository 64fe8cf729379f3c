pub mod database;
pub mod domain;
pub mod error;
pub mod http_server;
pub mod manager;
pub mod models;
pub mod ordering;
pub mod schema;

pub use error::ProjectsError;
pub use http_server::HttpServer;
pub use manager::ProjectManager;
