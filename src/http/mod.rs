//! Preview server

pub mod error;
pub mod server;
