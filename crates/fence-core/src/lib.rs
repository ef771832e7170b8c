//! # fence-core
//!
//! Core types, geometry, and error types for Fenceline.
//!
//! This crate provides the foundational types shared across all Fenceline crates:
//! - Identifier newtypes for vehicles and zones
//! - Planar geometry: points, closed rings, bounding boxes, containment
//! - GeoJSON polygon extraction for zone records
//! - Entity structs for positions, zones, assignments, and counters
//! - Epoch stamps, assignment events, and epoch summaries
//! - Cross-cutting error types
//! - Boundary traits for the position feed, zone source, and sinks

pub mod boundary;
pub mod entities;
pub mod epoch;
pub mod errors;
pub mod geojson;
pub mod geometry;
pub mod ids;
