//! Gateway protocol definitions
//!
//! Inbound event decoding and close codes. Outbound frames are
//! [`ServerEvent`](parley_core::ServerEvent)s.

mod close_codes;
mod messages;

pub use close_codes::CloseCode;
pub use messages::ClientEvent;
