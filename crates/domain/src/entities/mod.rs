//! Domain entities

mod outbound_request;

pub use outbound_request::{MessageBody, OutboundRequest};
