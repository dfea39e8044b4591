// src/config/mod.rs
pub mod ai;
