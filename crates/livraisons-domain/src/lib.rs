//! Domain rules for fleet deliveries
//!
//! Everything in `service` is a pure function over delivery lists; the
//! `repository` module defines the store the application talks to.

pub mod repository;
pub mod service;
