//! Message type definitions and routing.
//!
//! Splits the messaging concern into type definitions (the wire protocol)
//! and routing logic (dispatching parsed events into the coordinator and
//! delivering the resulting outbound batch).

pub mod router;
pub mod types;

pub use router::{deliver, route_client_message};
pub use types::{ClientEvent, MatchSnapshot, RosterEntry, SeatSnapshot, ServerEvent};
