pub mod geometry;
pub mod runner;
