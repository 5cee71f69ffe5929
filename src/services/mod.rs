pub mod access;
pub mod evaluation;
pub mod generation;
pub mod retrieval;
pub mod session;

pub use evaluation::EvaluationService;
pub use generation::{CreateTopic, GenerationService};
pub use retrieval::RetrievalService;
pub use session::SessionService;
