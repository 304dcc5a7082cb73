pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod process;
pub mod profile;
pub mod routes;
pub mod services;
