pub mod formatter;

pub use formatter::{format_json, format_models, format_response, format_score, should_use_colors};
