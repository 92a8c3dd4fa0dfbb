pub mod arc90;
pub mod config;
pub mod crypto;
pub mod error;
pub mod metadata;
pub mod network;

// Create / update / delete / read operations over injected backends
pub mod registry;
