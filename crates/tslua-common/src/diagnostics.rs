use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Diagnostic codes reported by the lowering passes.
///
/// Codes live in their own range so they never collide with front-end
/// (type checker) codes reported for the same file.
pub mod diagnostic_codes {
    pub const UNSUPPORTED_NODE_KIND: u32 = 100_001;
    pub const UNSUPPORTED_FOR_TARGET: u32 = 100_002;
    pub const CANNOT_ASSIGN_TO_NODE_OF_KIND: u32 = 100_003;
    pub const INVALID_AMBIENT_IDENTIFIER_NAME: u32 = 100_004;
    pub const UNSUPPORTED_PROPERTY_NAME: u32 = 100_005;
    pub const UNSUPPORTED_VAR_DECLARATION: u32 = 100_006;
    pub const UNSUPPORTED_RIGHT_SHIFT_OPERATOR: u32 = 100_007;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes};

    pub const UNSUPPORTED_NODE_KIND: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_NODE_KIND,
        category: DiagnosticCategory::Error,
        message: "Unsupported node kind {0}",
    };

    pub const UNSUPPORTED_FOR_TARGET: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_FOR_TARGET,
        category: DiagnosticCategory::Error,
        message: "{0} is/are not supported for target {1}.",
    };

    pub const CANNOT_ASSIGN_TO_NODE_OF_KIND: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::CANNOT_ASSIGN_TO_NODE_OF_KIND,
        category: DiagnosticCategory::Error,
        message: "Cannot create assignment assigning to a node of type {0}.",
    };

    pub const INVALID_AMBIENT_IDENTIFIER_NAME: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::INVALID_AMBIENT_IDENTIFIER_NAME,
        category: DiagnosticCategory::Error,
        message: "Invalid ambient identifier name '{0}'. Ambient identifiers must be valid lua identifiers.",
    };

    pub const UNSUPPORTED_PROPERTY_NAME: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_PROPERTY_NAME,
        category: DiagnosticCategory::Error,
        message: "Unsupported property name '{0}'.",
    };

    pub const UNSUPPORTED_VAR_DECLARATION: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_VAR_DECLARATION,
        category: DiagnosticCategory::Error,
        message: "`var` declarations are not supported. Use `let` or `const` instead.",
    };

    pub const UNSUPPORTED_RIGHT_SHIFT_OPERATOR: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_RIGHT_SHIFT_OPERATOR,
        category: DiagnosticCategory::Error,
        message: "Right shift operator is not supported for target Lua 5.3. Use `>>>` instead.",
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message_text: message.into(),
            code,
            file: file.into(),
            start,
            length,
        }
    }

    /// Create a diagnostic from a catalog message, substituting `{0}`, `{1}`...
    pub fn from_message(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            category: message.category,
            code: message.code,
            file: file.into(),
            start,
            length,
            message_text: format_message(message.message, args),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Replace `{N}` placeholders with the matching argument.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
#[path = "../tests/diagnostics.rs"]
mod tests;
