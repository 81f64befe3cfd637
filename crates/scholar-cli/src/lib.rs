//! Terminal interface for the Scholar research assistant

mod render;
mod ui;

#[cfg(test)]
mod tests;

pub use render::{
    render_answer, render_documents, render_error, render_papers, render_report, render_research,
    render_search, render_summary, render_trends, render_upload,
};
pub use ui::{ChatMode, display_banner, format_history, handle_input_with_history, print_help};

// Re-export core types
pub use scholar_core::{Error, Result};
