// src/models/mod.rs

pub mod assessment;
pub mod catalog;
pub mod item;
pub mod payload;
pub mod submission;
