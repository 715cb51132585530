use thiserror::Error;

use super::derivation::ArithFact;
use super::env::Env;
use super::syntax::{BinOp, Expr, Function, OperandFault, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("operands of '{op}' are ill-typed ({}): {left} {op} {right}", .fault.suffix())]
    Operand {
        op: BinOp,
        fault: OperandFault,
        left: Value,
        right: Value,
    },
    #[error("closure used as an operand of '{op}'")]
    ClosureOperand { op: BinOp },
    #[error("condition evaluated to {condition}, expected a boolean")]
    IfNotBool { condition: Value },
    #[error("condition evaluated to error")]
    IfError,
    #[error("unbound variable '{name}'")]
    UnboundVariable { name: String },
    #[error("index #{index} is out of range for an environment of depth {depth}")]
    IndexOutOfRange { index: usize, depth: usize },
    #[error("{value} is not a function")]
    NotAFunction { value: Value },
    #[error("integer overflow in {left} {op} {right}")]
    Overflow { op: BinOp, left: i64, right: i64 },
    #[error("let rec must bind a function literal, found {bound}")]
    LetRecNotFunction { bound: Expr },
}

impl EvalError {
    pub fn rule_name(&self) -> Option<&'static str> {
        match self {
            Self::Operand { op, fault, .. } => Some(operand_rule(*op, *fault)),
            Self::IfNotBool { .. } => Some("E-IfInt"),
            Self::IfError => Some("E-IfError"),
            _ => None,
        }
    }

    pub fn both_ill_typed(&self) -> bool {
        matches!(
            self,
            Self::Operand { left, right, .. }
                if left.as_int().is_none() && right.as_int().is_none()
        )
    }
}

pub(super) fn operand_rule(op: BinOp, fault: OperandFault) -> &'static str {
    match (op, fault) {
        (BinOp::Plus, OperandFault::BoolL) => "E-PlusBoolL",
        (BinOp::Plus, OperandFault::ErrorL) => "E-PlusErrorL",
        (BinOp::Plus, OperandFault::BoolR) => "E-PlusBoolR",
        (BinOp::Plus, OperandFault::ErrorR) => "E-PlusErrorR",
        (BinOp::Minus, OperandFault::BoolL) => "E-MinusBoolL",
        (BinOp::Minus, OperandFault::ErrorL) => "E-MinusErrorL",
        (BinOp::Minus, OperandFault::BoolR) => "E-MinusBoolR",
        (BinOp::Minus, OperandFault::ErrorR) => "E-MinusErrorR",
        (BinOp::Times, OperandFault::BoolL) => "E-TimesBoolL",
        (BinOp::Times, OperandFault::ErrorL) => "E-TimesErrorL",
        (BinOp::Times, OperandFault::BoolR) => "E-TimesBoolR",
        (BinOp::Times, OperandFault::ErrorR) => "E-TimesErrorR",
        (BinOp::Lt, OperandFault::BoolL) => "E-LtBoolL",
        (BinOp::Lt, OperandFault::ErrorL) => "E-LtErrorL",
        (BinOp::Lt, OperandFault::BoolR) => "E-LtBoolR",
        (BinOp::Lt, OperandFault::ErrorR) => "E-LtErrorR",
    }
}

pub(super) const fn operator_rule(op: BinOp) -> &'static str {
    match op {
        BinOp::Plus => "E-Plus",
        BinOp::Minus => "E-Minus",
        BinOp::Times => "E-Times",
        BinOp::Lt => "E-Lt",
    }
}

pub fn evaluate(env: &Env, expr: &Expr) -> Result<Value, EvalError> {
    match expr {
        Expr::Int(value) => Ok(Value::Int(*value)),
        Expr::Bool(value) => Ok(Value::Bool(*value)),
        Expr::Error => Ok(Value::Error),
        Expr::Var(name) => env
            .lookup(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable { name: name.clone() }),
        Expr::Index(index) => env
            .nth(*index)
            .cloned()
            .ok_or_else(|| EvalError::IndexOutOfRange {
                index: *index,
                depth: env.len(),
            }),
        Expr::BinOp { op, left, right } => {
            let left = evaluate(env, left)?;
            let right = evaluate(env, right)?;
            apply_operator(*op, left, right)
        }
        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => match evaluate(env, condition)? {
            Value::Bool(true) => evaluate(env, then_branch),
            Value::Bool(false) => evaluate(env, else_branch),
            Value::Error => Err(EvalError::IfError),
            condition => Err(EvalError::IfNotBool { condition }),
        },
        Expr::Let { name, bound, body } => {
            let bound = evaluate(env, bound)?;
            evaluate(&env.push(name.as_str(), bound), body)
        }
        Expr::LetRec { name, bound, body } => {
            let Expr::Fun(function) = bound.as_ref() else {
                return Err(EvalError::LetRecNotFunction {
                    bound: bound.as_ref().clone(),
                });
            };
            let closure = Value::RecClosure {
                env: env.clone(),
                name: name.clone(),
                function: function.clone(),
            };
            evaluate(&env.push(name.as_str(), closure), body)
        }
        Expr::Fun(function) => Ok(Value::Closure {
            env: env.clone(),
            function: function.clone(),
        }),
        Expr::App { func, arg } => {
            let callee = evaluate(env, func)?;
            let argument = evaluate(env, arg)?;
            let Some((body_env, function)) = enter_closure(&callee, argument) else {
                return Err(EvalError::NotAFunction {
                    value: callee.clone(),
                });
            };
            evaluate(&body_env, &function.body)
        }
    }
}

fn apply_operator(op: BinOp, left: Value, right: Value) -> Result<Value, EvalError> {
    if let Some(fault) = OperandFault::classify(&left, &right) {
        return Err(EvalError::Operand {
            op,
            fault,
            left,
            right,
        });
    }
    match (left, right) {
        (Value::Int(left), Value::Int(right)) => ArithFact::compute(op, left, right)
            .map(|fact| fact.result_value())
            .ok_or(EvalError::Overflow { op, left, right }),
        _ => Err(EvalError::ClosureOperand { op }),
    }
}

pub(super) fn enter_closure(callee: &Value, argument: Value) -> Option<(Env, &Function)> {
    match callee {
        Value::Closure { env, function } => {
            Some((env.push(function.param.as_str(), argument), function))
        }
        Value::RecClosure {
            env,
            name,
            function,
        } => {
            // A recursive closure binds itself before the parameter.
            let with_self = env.push(name.as_str(), callee.clone());
            let body_env = with_self.push(function.param.as_str(), argument);
            Some((body_env, function))
        }
        _ => None,
    }
}
