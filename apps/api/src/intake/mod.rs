// Resume intake: validate → extract → match → persist.
// All generation calls go through llm_client::StructuredGenerator.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod matching;
pub mod persist;
pub mod pipeline;
pub mod prompts;
pub mod validation;

pub use pipeline::IntakePipeline;
