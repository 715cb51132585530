use std::fmt;

use super::env::Env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Plus,
    Minus,
    Times,
    Lt,
}

impl BinOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Lt => "<",
        }
    }

    const fn precedence(self) -> u8 {
        match self {
            Self::Lt => 1,
            Self::Plus | Self::Minus => 2,
            Self::Times => 3,
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub param: String,
    pub body: Box<Expr>,
}

impl Function {
    pub fn new(param: impl Into<String>, body: Expr) -> Self {
        Self {
            param: param.into(),
            body: Box::new(body),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fun {} -> ", self.param)?;
        self.body.fmt_with_precedence(f, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Bool(bool),
    Error,
    Var(String),
    Index(usize),
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Let {
        name: String,
        bound: Box<Expr>,
        body: Box<Expr>,
    },
    LetRec {
        name: String,
        bound: Box<Expr>,
        body: Box<Expr>,
    },
    Fun(Function),
    App {
        func: Box<Expr>,
        arg: Box<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn binop(op: BinOp, left: Expr, right: Expr) -> Self {
        Self::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn plus(left: Expr, right: Expr) -> Self {
        Self::binop(BinOp::Plus, left, right)
    }

    pub fn minus(left: Expr, right: Expr) -> Self {
        Self::binop(BinOp::Minus, left, right)
    }

    pub fn times(left: Expr, right: Expr) -> Self {
        Self::binop(BinOp::Times, left, right)
    }

    pub fn lt(left: Expr, right: Expr) -> Self {
        Self::binop(BinOp::Lt, left, right)
    }

    pub fn if_then_else(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Self::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn let_in(name: impl Into<String>, bound: Expr, body: Expr) -> Self {
        Self::Let {
            name: name.into(),
            bound: Box::new(bound),
            body: Box::new(body),
        }
    }

    pub fn let_rec(name: impl Into<String>, bound: Expr, body: Expr) -> Self {
        Self::LetRec {
            name: name.into(),
            bound: Box::new(bound),
            body: Box::new(body),
        }
    }

    pub fn fun(param: impl Into<String>, body: Expr) -> Self {
        Self::Fun(Function::new(param, body))
    }

    pub fn app(func: Expr, arg: Expr) -> Self {
        Self::App {
            func: Box::new(func),
            arg: Box::new(arg),
        }
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Int(value) if *value < 0 => 5,
            Self::Int(_) | Self::Bool(_) | Self::Error | Self::Var(_) | Self::Index(_) => 6,
            Self::App { .. } => 4,
            Self::BinOp { op, .. } => op.precedence(),
            Self::If { .. } | Self::Let { .. } | Self::LetRec { .. } | Self::Fun(_) => 0,
        }
    }

    fn fmt_with_precedence(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        let needs_paren = self.precedence() < parent;
        if needs_paren {
            write!(f, "(")?;
        }

        match self {
            Self::Int(value) => write!(f, "{value}")?,
            Self::Bool(value) => write!(f, "{value}")?,
            Self::Error => write!(f, "error")?,
            Self::Var(name) => write!(f, "{name}")?,
            Self::Index(index) => write!(f, "#{index}")?,
            Self::BinOp { op, left, right } => {
                // A right operand of equal precedence keeps its parentheses.
                left.fmt_with_precedence(f, op.precedence())?;
                write!(f, " {op} ")?;
                right.fmt_with_precedence(f, op.precedence() + 1)?;
            }
            Self::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "if ")?;
                condition.fmt_with_precedence(f, 0)?;
                write!(f, " then ")?;
                then_branch.fmt_with_precedence(f, 0)?;
                write!(f, " else ")?;
                else_branch.fmt_with_precedence(f, 0)?;
            }
            Self::Let { name, bound, body } => {
                write!(f, "let {name} = ")?;
                bound.fmt_with_precedence(f, 0)?;
                write!(f, " in ")?;
                body.fmt_with_precedence(f, 0)?;
            }
            Self::LetRec { name, bound, body } => {
                write!(f, "let rec {name} = ")?;
                bound.fmt_with_precedence(f, 0)?;
                write!(f, " in ")?;
                body.fmt_with_precedence(f, 0)?;
            }
            Self::Fun(function) => write!(f, "{function}")?,
            Self::App { func, arg } => {
                func.fmt_with_precedence(f, 4)?;
                write!(f, " ")?;
                arg.fmt_with_precedence(f, 6)?;
            }
        }

        if needs_paren {
            write!(f, ")")?;
        }

        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_precedence(f, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Error,
    Closure {
        env: Env,
        function: Function,
    },
    RecClosure {
        env: Env,
        name: String,
        function: Function,
    },
}

impl Value {
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Error => write!(f, "error"),
            Self::Closure { env, function } => write!(f, "({env})[{function}]"),
            Self::RecClosure {
                env,
                name,
                function,
            } => write!(f, "({env})[rec {name} = {function}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandFault {
    BoolL,
    ErrorL,
    BoolR,
    ErrorR,
}

impl OperandFault {
    pub fn of_left(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::BoolL),
            Value::Error => Some(Self::ErrorL),
            _ => None,
        }
    }

    pub fn of_right(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::BoolR),
            Value::Error => Some(Self::ErrorR),
            _ => None,
        }
    }

    pub fn classify(left: &Value, right: &Value) -> Option<Self> {
        match left {
            Value::Int(_) => Self::of_right(right),
            _ => Self::of_left(left),
        }
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::BoolL => "BoolL",
            Self::ErrorL => "ErrorL",
            Self::BoolR => "BoolR",
            Self::ErrorR => "ErrorR",
        }
    }
}
