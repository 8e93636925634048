//! service-core: Shared infrastructure for the campus dashboard services.
pub mod error;
pub mod middleware;
pub mod observability;
