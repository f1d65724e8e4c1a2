//! Birth plan assistant: a guided conversation that ends in a structured
//! birth plan.

pub mod config;
pub mod dialogue;
pub mod error;
pub mod llm;
pub mod plan;
