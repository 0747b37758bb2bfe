pub mod errors;
pub mod import;
pub mod models;
pub mod ports;
pub mod service;
