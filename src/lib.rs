pub mod codegen;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod models;
pub mod registry;
pub mod search;
pub mod service;
pub mod session;
