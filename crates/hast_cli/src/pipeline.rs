//! Shared pipeline helpers for CLI commands: project configuration lookup,
//! design file loading and diagnostic rendering.

use std::path::{Path, PathBuf};

use hast_common::Interner;
use hast_config::{load_config, load_config_from_str, ProjectConfig, CONFIG_FILE_NAME};
use hast_diagnostics::{
    Diagnostic, DiagnosticRenderer, JsonRenderer, Severity, TerminalRenderer,
};
use hast_ir::{Design, DesignFile};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `hast.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Loads the project configuration.
///
/// `--config` names either the file or its directory. Without it the nearest
/// `hast.toml` above the current directory is used, and without one of those
/// every setting takes its default.
pub fn load_project_config(global: &GlobalArgs) -> Result<ProjectConfig, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let path = PathBuf::from(config_path);
        let config = if path.is_dir() {
            load_config(&path)?
        } else {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            load_config_from_str(&content)?
        };
        return Ok(config);
    }

    let cwd = std::env::current_dir()?;
    match find_project_root(&cwd) {
        Some(root) => Ok(load_config(&root)?),
        None => {
            let name = cwd
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "hast".to_string());
            Ok(ProjectConfig::with_name(name))
        }
    }
}

/// Reads a design file and re-interns its names.
pub fn load_design(path: &Path) -> Result<(Design, Interner), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let file: DesignFile = serde_json::from_str(&content)
        .map_err(|e| format!("{} is not a design file: {e}", path.display()))?;
    Ok(file.restore()?)
}

/// Renders diagnostics to stderr, one per block of text or line of JSON.
pub fn render_diagnostics(diagnostics: &[Diagnostic], json: bool, color: bool) {
    if json {
        let renderer = JsonRenderer;
        for diag in diagnostics {
            eprintln!("{}", renderer.render(diag));
        }
    } else {
        let renderer = TerminalRenderer::new(color, 100);
        for diag in diagnostics {
            eprintln!("{}", renderer.render(diag));
        }
    }
}

/// Number of errors and warnings among `diagnostics`.
pub fn count_by_severity(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    (errors, warnings)
}
