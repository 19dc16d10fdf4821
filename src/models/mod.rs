pub mod check_config;
pub mod result_row;

// Re-exports for convenience
pub use check_config::*;
pub use result_row::*;
