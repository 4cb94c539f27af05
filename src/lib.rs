pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;
