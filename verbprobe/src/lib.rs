// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{init_logging, initialize, load_inputs, load_urls_from_file, resolve_db_path};

// Re-export batch functionality from verbprobe-core
pub use verbprobe_core::batch::{BatchOptions, BatchProgressCallback, BatchResult, execute_batch};
