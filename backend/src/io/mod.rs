//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Requests are
//! decoded into the shared DTOs, handed to a service and the result, or
//! the error mapped to a status code, is written back as JSON.

pub mod rest;

pub use rest::*;
