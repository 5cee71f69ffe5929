pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod services;

pub use error::{Error, Result};
