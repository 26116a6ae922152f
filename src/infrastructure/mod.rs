//! Infrastructure layer - store backends, caching and observability

pub mod customer;
pub mod logging;
pub mod observability;
pub mod storage;
