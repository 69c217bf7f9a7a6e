//! # courier-std
//!
//! Registry construction and dispatch for the Courier mediator.
//!
//! This crate provides:
//! - **Discovery**: [`unit::Unit`] and [`unit::TypeDef`] describe what a
//!   scanned unit declares; [`catalog::Catalog`] indexes it
//! - **Specialization**: [`specialize::Specializer`] closes open
//!   implementations over the catalog under [`specialize::Limits`] and a
//!   [`specialize::BuildBudget`]
//! - **Registry**: [`registry::Registry`], built once from a
//!   [`config::Configuration`] and read-only afterwards
//! - **Dispatch**: [`mediator::Mediator`] with [`services::ServiceCollection`]
//!   as a reference locator
//! - **Publishing**: [`publish::SequentialPublisher`] and
//!   [`publish::ConcurrentPublisher`]
//! - **Standard behaviors**: Logging, Timeout, Retry

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use courier_core;

// Modules
pub mod behaviors;
pub mod catalog;
pub mod config;
pub mod mediator;
pub mod publish;
pub mod registry;
pub mod services;
pub mod specialize;
pub mod testing;
pub mod unit;

#[cfg(feature = "inventory")]
pub use inventory;
