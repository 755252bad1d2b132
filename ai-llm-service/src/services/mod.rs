//! Backend client implementations.

pub mod fake_service;
pub mod ollama_service;
pub mod open_ai_service;
