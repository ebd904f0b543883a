// macmap-snmp: Async SNMP transport for walking switch bridge and interface tables.
//
// Consumers (macmap-core) only see `ObjectId`, `SnmpValue`, and the
// `SnmpSession` / `SessionFactory` traits. The `snmp2`-backed client talks
// to real agents; the in-memory agents script switches for tests and dry runs.

pub mod client;
pub mod error;
pub mod memory;
pub mod oid;
pub mod session;
pub mod transport;
pub mod value;

pub use client::{Snmp2Factory, Snmp2Session};
pub use error::Error;
pub use memory::{Failure, MemoryAgent, MemoryFactory, MemorySession};
pub use oid::ObjectId;
pub use session::{Credentials, SessionFactory, SnmpSession};
pub use transport::TransportConfig;
pub use value::{SnmpValue, VarBind};
