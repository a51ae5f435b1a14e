//! Uniformly Core - Shared types and rules.
//!
//! This crate provides the domain vocabulary used by every Uniformly component:
//! - `storefront` - JSON API for schools, carts, orders, and order confirmations
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything here can be unit tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, phones, and order statuses
//! - [`pricing`] - Uniform configuration flows and their price tables
//! - [`draft`] - Pending order draft assembled from priced selections
//! - [`checkout`] - Turns cart lines into an order plan with a computed total
//! - [`confirmation`] - Validated order confirmation ready to be rendered and sent

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod confirmation;
pub mod draft;
pub mod pricing;
pub mod types;

pub use types::*;
