//! Centralized limits and thresholds for the lowering passes and printer.

/// Maximum number of temporaries an expression list may introduce to keep
/// left-to-right evaluation order before falling back to building an
/// ordered sparse array at runtime.
pub const MAX_ORDERING_TEMPS: usize = 2;

/// Expression lists longer than this always print one element per line.
pub const MAX_INLINE_LIST_LENGTH: usize = 4;

/// Maximum recursion depth for lowering nested source expressions.
///
/// Deeper trees are reported as unsupported instead of overflowing the stack.
pub const MAX_LOWERING_DEPTH: u32 = 500;

/// Indentation unit used by the printer.
pub const INDENT: &str = "    ";
