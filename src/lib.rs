// src/lib.rs

pub mod config;
pub mod error;
pub mod llm;
pub mod relay;
pub mod server;
pub mod session;
