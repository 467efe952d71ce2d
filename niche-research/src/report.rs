//! Markdown strategy report

use crate::engine::CrewOutput;
use niche_core::{ErrorContext, NicheError, NicheResult};
use std::path::Path;
use tracing::info;

/// Title header, run details and the final task output
pub fn render_report(output: &CrewOutput) -> String {
    let body = output.final_output.trim();
    // Models often open with their own top-level heading
    let body = match body.strip_prefix("# ") {
        Some(rest) => rest.split_once('\n').map(|(_, r)| r.trim_start()).unwrap_or(""),
        None => body,
    };

    format!(
        "# Blog Strategy Report: {}\n\n\
         _Generated {} by a {} research run ({}), {} keywords ranked._\n\n\
         {}\n",
        output.topic,
        output.finished_at.format("%Y-%m-%d %H:%M UTC"),
        match output.process {
            niche_core::ProcessMode::Sequential => "sequential",
            niche_core::ProcessMode::Hierarchical => "hierarchical",
        },
        output.run_id,
        output.state.ranked_keywords.len(),
        body
    )
}

/// Write the report, creating parent directories as needed
pub fn write_report(path: &Path, output: &CrewOutput) -> NicheResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, render_report(output)).map_err(|e| NicheError::Internal {
        message: format!("Failed to write report to {}: {}", path.display(), e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("report")
            .with_operation("write_report")
            .with_suggestion("Check that the output directory is writable"),
    })?;

    info!("Report generated: {}", path.display());
    Ok(())
}
