//! Region and contact directory with a cache-aside layer in front of
//! PostgreSQL.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
