use std::fmt;

use super::env::Env;
use super::syntax::{BinOp, Expr, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    // `None` when written without a turnstile.
    pub env: Option<Env>,
    pub expr: Expr,
    pub value: Value,
}

impl Judgment {
    pub fn new(env: Option<Env>, expr: Expr, value: Value) -> Self {
        Self { env, expr, value }
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.env {
            None => {}
            Some(env) if env.is_empty() => write!(f, "|- ")?,
            Some(env) => write!(f, "{env} |- ")?,
        }
        write!(f, "{} evalto {}", self.expr, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithFact {
    Plus { left: i64, right: i64, result: i64 },
    Minus { left: i64, right: i64, result: i64 },
    Times { left: i64, right: i64, result: i64 },
    LessThan { left: i64, right: i64, result: bool },
}

impl ArithFact {
    pub fn compute(op: BinOp, left: i64, right: i64) -> Option<Self> {
        let fact = match op {
            BinOp::Plus => Self::Plus {
                left,
                right,
                result: left.checked_add(right)?,
            },
            BinOp::Minus => Self::Minus {
                left,
                right,
                result: left.checked_sub(right)?,
            },
            BinOp::Times => Self::Times {
                left,
                right,
                result: left.checked_mul(right)?,
            },
            BinOp::Lt => Self::LessThan {
                left,
                right,
                result: left < right,
            },
        };
        Some(fact)
    }

    pub fn result_value(&self) -> Value {
        match *self {
            Self::Plus { result, .. } | Self::Minus { result, .. } | Self::Times { result, .. } => {
                Value::Int(result)
            }
            Self::LessThan { result, .. } => Value::Bool(result),
        }
    }

    pub const fn rule(&self) -> &'static str {
        match self {
            Self::Plus { .. } => "B-Plus",
            Self::Minus { .. } => "B-Minus",
            Self::Times { .. } => "B-Times",
            Self::LessThan { .. } => "B-Lt",
        }
    }
}

impl fmt::Display for ArithFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plus {
                left,
                right,
                result,
            } => write!(f, "{left} plus {right} is {result}"),
            Self::Minus {
                left,
                right,
                result,
            } => write!(f, "{left} minus {right} is {result}"),
            Self::Times {
                left,
                right,
                result,
            } => write!(f, "{left} times {right} is {result}"),
            Self::LessThan {
                left,
                right,
                result,
            } => write!(f, "{left} less than {right} is {result}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Premise {
    Derivation(Derivation),
    Fact(ArithFact),
}

impl From<Derivation> for Premise {
    fn from(derivation: Derivation) -> Self {
        Self::Derivation(derivation)
    }
}

impl From<ArithFact> for Premise {
    fn from(fact: ArithFact) -> Self {
        Self::Fact(fact)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub conclusion: Judgment,
    pub rule: &'static str,
    pub premises: Vec<Premise>,
}

impl Derivation {
    pub fn new(conclusion: Judgment, rule: &'static str, premises: Vec<Premise>) -> Self {
        Self {
            conclusion,
            rule,
            premises,
        }
    }

    pub fn value(&self) -> &Value {
        &self.conclusion.value
    }

    pub fn subderivations(&self) -> impl Iterator<Item = &Derivation> {
        self.premises.iter().filter_map(|premise| match premise {
            Premise::Derivation(derivation) => Some(derivation),
            Premise::Fact(_) => None,
        })
    }

    /// Number of nested rule applications, counting this one.
    pub fn depth(&self) -> usize {
        1 + self
            .premises
            .iter()
            .map(|premise| match premise {
                Premise::Derivation(derivation) => derivation.depth(),
                Premise::Fact(_) => 1,
            })
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_derivation(self, f, 0)
    }
}

fn format_derivation(
    derivation: &Derivation,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
) -> fmt::Result {
    f.write_str(&"  ".repeat(indent))?;
    write!(f, "{} by {}", derivation.conclusion, derivation.rule)?;
    if derivation.premises.is_empty() {
        return write!(f, "{{}};");
    }

    writeln!(f, "{{")?;
    for premise in &derivation.premises {
        match premise {
            Premise::Derivation(sub) => format_derivation(sub, f, indent + 1)?,
            Premise::Fact(fact) => {
                f.write_str(&"  ".repeat(indent + 1))?;
                write!(f, "{fact} by {}{{}};", fact.rule())?;
            }
        }
        writeln!(f)?;
    }
    f.write_str(&"  ".repeat(indent))?;
    write!(f, "}};")
}
