//! paygate - micro-deposit verification
//!
//! Proves a user controls a linked bank account by sending two small random
//! ACH deposits plus a balancing withdrawal, then asking for the amounts back.
//!
//! # Modules
//!
//! - [`money`] - Integer-cent `Amount` and its textual forms
//! - [`ach`] - Verification file construction and reversal synthesis
//! - [`depository`] - Bank accounts under verification
//! - [`clients`] - File-transfer processor and ledger clients
//! - [`micro_deposit`] - Amounts, store, cursor, workflow, merge sweep
//! - [`events`] - Transfer audit events
//! - [`gateway`] - Public and admin HTTP routers
//! - [`config`] / [`logging`] / [`db`] - Process plumbing

pub mod ach;
pub mod clients;
pub mod config;
pub mod db;
pub mod depository;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod micro_deposit;
pub mod money;

pub use money::{Amount, MoneyError};
