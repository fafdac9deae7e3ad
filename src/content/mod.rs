// src/content/mod.rs
pub mod generator;
pub mod merge;
pub mod sync;
pub mod types;
