use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// A message authored by the orchestrator itself. Tool output never goes
/// through this type; see [`crate::PipelineDiagnostics::push_tool_output`].
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub suggestions: Vec<String>,
    pub source_context: Option<String>,
}

impl Diagnostic {
    fn with_level(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            suggestions: Vec::new(),
            source_context: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source_context(mut self, context: impl Into<String>) -> Self {
        self.source_context = Some(context.into());
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;

        if !self.suggestions.is_empty() {
            let hints = self.suggestions.join("; ");
            write!(f, " (hints: {})", hints)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_appends_hints() {
        let diag = Diagnostic::error("`llc` not found in PATH")
            .with_suggestion("install LLVM")
            .with_suggestion("check PATH");
        assert_eq!(
            diag.to_string(),
            "`llc` not found in PATH (hints: install LLVM; check PATH)"
        );
    }

    #[test]
    fn plain_message_has_no_hint_suffix() {
        let diag = Diagnostic::warning("failed to remove main.ll").with_source_context("cleanup");
        assert_eq!(diag.to_string(), "failed to remove main.ll");
        assert_eq!(diag.source_context.as_deref(), Some("cleanup"));
    }

    #[test]
    fn info_keeps_its_level() {
        let diag = Diagnostic::info("linked main").with_source_context("link");
        assert_eq!(diag.level, DiagnosticLevel::Info);
        assert_eq!(diag.to_string(), "linked main");
    }
}
