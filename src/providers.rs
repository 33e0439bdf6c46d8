//! Backend provider implementations.

pub mod generative_engine;

// Re-export for convenience
pub use generative_engine::GenerativeEngineClient;
