//! The stable catalog of mutation rule codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleCode {
    Array,
    BlockStatement,
    Comparison,
    Literal,
    LogicalExpression,
    Math,
    MethodCall,
    Object,
    UnaryExpression,
    UpdateExpression,
}

impl RuleCode {
    pub const ALL: [RuleCode; 10] = [
        RuleCode::Array,
        RuleCode::BlockStatement,
        RuleCode::Comparison,
        RuleCode::Literal,
        RuleCode::LogicalExpression,
        RuleCode::Math,
        RuleCode::MethodCall,
        RuleCode::Object,
        RuleCode::UnaryExpression,
        RuleCode::UpdateExpression,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleCode::Array => "ARRAY",
            RuleCode::BlockStatement => "BLOCK_STATEMENT",
            RuleCode::Comparison => "COMPARISON",
            RuleCode::Literal => "LITERAL",
            RuleCode::LogicalExpression => "LOGICAL_EXPRESSION",
            RuleCode::Math => "MATH",
            RuleCode::MethodCall => "METHOD_CALL",
            RuleCode::Object => "OBJECT",
            RuleCode::UnaryExpression => "UNARY_EXPRESSION",
            RuleCode::UpdateExpression => "UPDATE_EXPRESSION",
        }
    }

    /// Arithmetic and increment/decrement flips produce too many false
    /// positives and non-terminating mutants to be on unless asked for.
    pub fn excluded_by_default(self) -> bool {
        matches!(self, RuleCode::Math | RuleCode::UpdateExpression)
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRuleCode(pub String);

impl fmt::Display for UnknownRuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mutation rule code '{}'", self.0)
    }
}

impl std::error::Error for UnknownRuleCode {}

impl FromStr for RuleCode {
    type Err = UnknownRuleCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownRuleCode(s.to_string()))
    }
}
