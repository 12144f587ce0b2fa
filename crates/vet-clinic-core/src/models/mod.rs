//! Domain models for the clinic registry.

mod appointment;
mod client;
mod ids;
mod person;
mod pet;
mod service;
mod validation;
mod veterinarian;

pub use appointment::*;
pub use client::*;
pub use ids::*;
pub use person::*;
pub use pet::*;
pub use service::*;
pub use validation::*;
pub use veterinarian::*;
