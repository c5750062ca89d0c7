// Use cases layer: application workflows for the relay server.

pub mod relay;
pub mod roster;
pub mod types;

pub use relay::relay_task;
pub use types::{Outbound, RelayEvent, RelaySettings, StatusReport};
