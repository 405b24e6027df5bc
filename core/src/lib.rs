//! Customer-onboarding wizard core.
//!
//! The wizard stages KYC, product and mandate data across steps and then
//! commits it to the back office through `RemoteGateway` as a compensable
//! sequence of calls. `store` is an in-process SQLite back office;
//! `fault` wraps any gateway with reproducible failures.

pub mod activation;
pub mod audit;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod fault;
pub mod gate;
pub mod gateway;
pub mod kyc_step;
pub mod mandate_rule_step;
pub mod mandate_step;
pub mod product_step;
pub mod reference;
pub mod route;
pub mod saga;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;
pub mod wizard;
