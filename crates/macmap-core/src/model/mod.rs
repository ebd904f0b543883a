// ── Domain model ──
//
// Canonical types shared by the interrogator, the cache, and consumers.

mod mac;
mod topology;

pub use mac::{MacAddress, ParseMacError};
pub use topology::{MacLocation, MacObservation, SwitchCompletion, SwitchReport, SwitchTarget};
