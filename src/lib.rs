pub mod aggregate;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod ingest;
pub mod timeline;
