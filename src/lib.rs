//! Loyalty points ledger
//!
//! Customers earn points for every purchase and spend them on a fixed-cost reward. The ledger
//! operations live in [`commands`] as [`tower::Service`] implementations on
//! [`commands::DomainLogic`], and reach the customer store through
//! [`ports::database::DatabasePort`].

pub mod adapters;
pub mod commands;
pub mod domain;
pub mod ports;
pub mod settings;
pub mod telemetry;
