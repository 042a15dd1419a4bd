// src/session/mod.rs

pub mod authoring;
pub mod autosave;
pub mod grading;

pub use authoring::{AuthoringSession, ItemField, Notice, SaveOutcome, Tone, ValidationOutcome};
pub use grading::{DisplayItem, GradingSession, Phase};
