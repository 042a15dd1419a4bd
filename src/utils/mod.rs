// src/utils/mod.rs

pub mod debounce;
pub mod html;
