//! Birth plan document: schema, model, defaults, synthesis and rendering.

pub mod defaults;
pub mod model;
pub mod prompts;
pub mod render;
pub mod schema;
pub mod synthesizer;

pub use model::{BirthPlan, GeneratedPlan, PlanSource};
pub use render::CLOSING_STATEMENT;
pub use synthesizer::PlanSynthesizer;
