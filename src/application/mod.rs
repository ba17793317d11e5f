//! Application services: validation, store access and cache coordination.

pub mod contacts;
pub mod error;
pub mod pagination;
pub mod regions;
pub mod repos;
