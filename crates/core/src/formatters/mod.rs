pub mod context;

pub use context::{ContextConfig, ContextFormatter, format_context};
