mod engine;
mod types;

pub use engine::project;
pub use types::{Inputs, Projection, ProjectionError, Recommendation, YearResult};
