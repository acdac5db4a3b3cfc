//! Value objects - Immutable objects defined by their attributes

mod recipient_id;

pub use recipient_id::{MIN_RECIPIENT_DIGITS, RecipientId};
