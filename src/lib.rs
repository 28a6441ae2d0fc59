//! Room Finder: watches Swiss room-rental sites and pushes a notification for
//! every listing it has not seen before.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod scrapers;
pub mod store;
