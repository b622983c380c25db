//! careseek - specialist search with ranked, graded and persistent results
//!
//! Runs a clinical description through a recommendation service, a
//! provider directory and a ranking service, then keeps the ranked list,
//! its letter grades and the user's filter state in a durable session so
//! the same view comes back on the next visit.

pub mod cli;
pub mod config;
pub mod error;
pub mod filtering;
pub mod orchestrator;
pub mod provider;
pub mod ranking;
pub mod services;
pub mod session;
pub mod storage;
pub mod store;
pub mod view;

pub use error::{CareseekError, Result};
