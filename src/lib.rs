// Sonic investment service: price quotes, risk analysis, investment transfers and user records.

pub mod config;
pub mod error;
pub mod execution;
pub mod handlers;
pub mod history;
pub mod models;
pub mod price;
pub mod server;
pub mod store;
pub mod token_analysis;
pub mod wallet;

pub use server::{create_router, AppState, InvestSettings};
