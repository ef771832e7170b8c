//! Repository modules implementing CRUD operations for all Fenceline tables.
//!
//! Each module adds methods to `FenceStore` via `impl FenceStore` blocks.

pub mod assignment;
pub mod counter;
pub mod mapping;
pub mod vehicle;
pub mod zone;
