//! Entity structs for all Fenceline domain objects.
//!
//! Each entity maps to a table in the store (see `fence-db`). All structs
//! derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON output and
//! schema validation.

mod assignment;
mod counter;
mod vehicle;
mod zone;

pub use assignment::{Assignment, MappingRow};
pub use counter::Counter;
pub use vehicle::VehiclePosition;
pub use zone::{Zone, ZoneRecord};
