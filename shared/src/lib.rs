//! Blog Shared Library
//!
//! Wire types and input validation shared by the backend and any
//! client of the blog API.

pub mod types;
pub mod validation;

// Re-export commonly used items
pub use types::*;
