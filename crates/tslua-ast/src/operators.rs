//! Lua operators.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// `-x`
    Negation,
    /// `#x`
    Length,
    /// `not x`
    Not,
    /// `~x` (5.3+)
    BitwiseNot,
}

impl UnaryOperator {
    /// Printed token, including the trailing space `not` needs.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Negation => "-",
            UnaryOperator::Length => "#",
            UnaryOperator::Not => "not ",
            UnaryOperator::BitwiseNot => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Addition,
    Subtraction,
    Multiplication,
    Division,
    FloorDivision,
    Modulo,
    Power,
    // String
    Concat,
    // Relational
    Equality,
    Inequality,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    // Logical
    And,
    Or,
    // Bitwise (5.3+)
    BitwiseAnd,
    BitwiseOr,
    BitwiseExclusiveOr,
    BitwiseRightShift,
    BitwiseLeftShift,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Addition => "+",
            BinaryOperator::Subtraction => "-",
            BinaryOperator::Multiplication => "*",
            BinaryOperator::Division => "/",
            BinaryOperator::FloorDivision => "//",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "..",
            BinaryOperator::Equality => "==",
            BinaryOperator::Inequality => "~=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseExclusiveOr => "~",
            BinaryOperator::BitwiseRightShift => ">>",
            BinaryOperator::BitwiseLeftShift => "<<",
        }
    }
}
