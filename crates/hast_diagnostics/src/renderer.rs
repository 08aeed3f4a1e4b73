//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// error[C001]: member invokes Primes::IsPrime 4 times in parallel but at most 3 is allowed
///   --> Primes::ParallelizedCount
///    = in: invocation of Primes::IsPrime
///    = note: ...
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// The terminal width; notes longer than this are wrapped.
    pub width: u16,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool, width: u16) -> Self {
        Self { color, width }
    }

    fn paint(&self, text: &str, ansi: &str) -> String {
        if self.color {
            format!("\x1b[{ansi}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn severity_color(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
            Severity::Note => "1;36",
        }
    }

    fn push_footer(&self, out: &mut String, kind: &str, text: &str) {
        let prefix = format!("   = {kind}: ");
        let budget = (self.width as usize).saturating_sub(prefix.len()).max(20);
        let indent = " ".repeat(prefix.len());
        for (i, line) in wrap(text, budget).into_iter().enumerate() {
            if i == 0 {
                out.push_str(&prefix);
            } else {
                out.push_str(&indent);
            }
            out.push_str(&line);
            out.push('\n');
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let header = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(&header, Self::severity_color(diag.severity)),
            diag.message
        ));

        if let Some(member) = &diag.member {
            out.push_str(&format!("  {} {member}\n", self.paint("-->", "1;34")));
        }
        if let Some(construct) = &diag.construct {
            self.push_footer(&mut out, "in", construct);
        }
        for note in &diag.notes {
            self.push_footer(&mut out, "note", note);
        }
        for help in &diag.help {
            self.push_footer(&mut out, "help", help);
        }

        out
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Renders each diagnostic as a single line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let code = diag.code.to_string();
        let value = serde_json::json!({
            "severity": diag.severity.to_string(),
            "code": code,
            "message": diag.message,
            "member": diag.member,
            "construct": diag.construct,
            "notes": diag.notes,
            "help": diag.help,
        });
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    #[test]
    fn render_error_with_member() {
        let code = DiagnosticCode::new(Category::Error, 103);
        let diag = Diagnostic::error(code, "break outside of a loop or switch")
            .with_member("Loops::Run")
            .with_construct("break statement");

        let output = TerminalRenderer::new(false, 80).render(&diag);

        assert!(output.contains("error[E103]: break outside of a loop or switch"));
        assert!(output.contains("--> Loops::Run"));
        assert!(output.contains("= in: break statement"));
    }

    #[test]
    fn render_warning_with_notes() {
        let code = DiagnosticCode::new(Category::Warning, 1);
        let diag = Diagnostic::warning(code, "throw statement omitted")
            .with_note("hardware has no exceptions")
            .with_help("return an error code instead");

        let output = TerminalRenderer::new(false, 80).render(&diag);

        assert!(output.contains("warning[W001]: throw statement omitted"));
        assert!(output.contains("= note: hardware has no exceptions"));
        assert!(output.contains("= help: return an error code instead"));
        assert!(!output.contains("-->"));
    }

    #[test]
    fn color_wraps_header_in_ansi() {
        let code = DiagnosticCode::new(Category::Error, 999);
        let diag = Diagnostic::error(code, "general error");
        let output = TerminalRenderer::new(true, 80).render(&diag);
        assert!(output.starts_with("\x1b[1;31merror[E999]\x1b[0m"));
    }

    #[test]
    fn long_notes_wrap_at_width() {
        let code = DiagnosticCode::new(Category::Warning, 2);
        let diag = Diagnostic::warning(code, "recursion").with_note(
            "the member calls itself through a cycle of invocations and no recursion depth is configured",
        );
        let output = TerminalRenderer::new(false, 40).render(&diag);
        let note_lines: Vec<_> = output.lines().skip(1).collect();
        assert!(note_lines.len() > 1);
        assert!(note_lines.iter().all(|l| l.len() <= 40));
    }

    #[test]
    fn wrap_keeps_single_short_line() {
        assert_eq!(wrap("short text", 80), vec!["short text".to_string()]);
        assert_eq!(wrap("", 80), vec![String::new()]);
    }

    #[test]
    fn json_renderer_emits_parseable_object() {
        let code = DiagnosticCode::new(Category::Error, 104);
        let diag = Diagnostic::error(code, "unknown label 'again'").with_member("M::Run");
        let line = JsonRenderer.render(&diag);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["code"], "E104");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["member"], "M::Run");
        assert!(value["construct"].is_null());
    }
}
