//! Domain layer for the WhatsApp relay
//!
//! Contains the outbound request model, recipient normalization and
//! domain errors. This layer does no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
