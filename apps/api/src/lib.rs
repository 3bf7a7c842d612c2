//! Resume parsing and job-description matching.
//!
//! [`engine`] and [`embeddings`] hold the matching pipeline; the other modules
//! are the HTTP service built around it.

pub mod analysis;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod llm_client;
pub mod matching;
pub mod models;
pub mod resumes;
pub mod routes;
pub mod security;
pub mod state;
pub mod storage;
