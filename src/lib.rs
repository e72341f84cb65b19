//! Cost normalization and forecasting.
//!
//! Cost items billed at any [`models::Frequency`] are normalized to a monthly
//! figure, aggregated across categories, projected into a monthly forecast,
//! and compared across scenarios. The engine modules are pure; `config`,
//! `storage` and `report` belong to the command-line front end.

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod normalize;
pub mod report;
pub mod storage;
