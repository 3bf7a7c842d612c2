pub mod analyzer;
pub mod handlers;
pub mod prompts;
