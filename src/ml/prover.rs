use thiserror::Error;

use crate::core::CheckError;

use super::derivation::{ArithFact, Derivation, Judgment, Premise};
use super::env::Env;
use super::evaluator::{enter_closure, operand_rule, operator_rule};
use super::syntax::{BinOp, Expr, Function, OperandFault, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    #[error("unbound variable '{name}'")]
    UnboundVariable { name: String },
    #[error("index #{index} is out of range for an environment of depth {depth}")]
    IndexOutOfRange { index: usize, depth: usize },
    #[error("{value} is not a function")]
    NotAFunction { value: Value },
    #[error("integer overflow in {left} {op} {right}")]
    Overflow { op: BinOp, left: i64, right: i64 },
    #[error("closure used as an operand of '{op}'")]
    ClosureOperand { op: BinOp },
    #[error("closure used as an if condition")]
    ClosureCondition,
    #[error("let rec must bind a function literal, found {bound}")]
    LetRecNotFunction { bound: Expr },
}

pub fn infer(env: &Env, expr: &Expr) -> Result<Derivation, InferError> {
    Inference { bare: false }.infer(env, expr)
}

pub fn infer_bare(expr: &Expr) -> Result<Derivation, InferError> {
    Inference { bare: true }.infer(&Env::new(), expr)
}

pub fn prove_judgment(judgment: &Judgment) -> Result<Derivation, CheckError> {
    let inference = Inference {
        bare: judgment.env.is_none(),
    };
    let env = judgment.env.clone().unwrap_or_default();
    let derivation = inference
        .infer(&env, &judgment.expr)
        .map_err(|error| non_derivable_judgment_error(judgment, None, Some(&error)))?;

    if derivation.value() == &judgment.value {
        Ok(derivation)
    } else {
        Err(non_derivable_judgment_error(judgment, Some(&derivation.conclusion), None))
    }
}

fn non_derivable_judgment_error(
    actual: &Judgment,
    expected: Option<&Judgment>,
    cause: Option<&InferError>,
) -> CheckError {
    match (expected, cause) {
        (Some(expected), _) => {
            let fix = format!("fix: replace value with {}", expected.value);
            CheckError::rule_violation(format!(
                "judgment is not derivable (expected: {expected}, actual: {actual}; {fix})"
            ))
        }
        (None, Some(cause)) => CheckError::rule_violation(format!(
            "judgment is not derivable (actual: {actual}; {cause})"
        )),
        (None, None) => CheckError::rule_violation(format!(
            "judgment is not derivable (actual: {actual})"
        )),
    }
}

struct Inference {
    bare: bool,
}

impl Inference {
    fn infer(&self, env: &Env, expr: &Expr) -> Result<Derivation, InferError> {
        log::trace!("infer [{env}] {expr}");
        match expr {
            Expr::Int(value) => Ok(self.axiom(env, expr, Value::Int(*value), "E-Int")),
            Expr::Bool(value) => Ok(self.axiom(env, expr, Value::Bool(*value), "E-Bool")),
            Expr::Error => Ok(self.axiom(env, expr, Value::Error, "E-Error")),
            Expr::Var(name) => self.infer_var(env, expr, name),
            Expr::Index(index) => self.infer_index(env, expr, *index),
            Expr::BinOp { op, left, right } => self.infer_binop(env, expr, *op, left, right),
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => self.infer_if(env, expr, condition, then_branch, else_branch),
            Expr::Let { name, bound, body } => self.infer_let(env, expr, name, bound, body),
            Expr::LetRec { name, bound, body } => self.infer_let_rec(env, expr, name, bound, body),
            Expr::Fun(function) => Ok(self.infer_fun(env, expr, function)),
            Expr::App { func, arg } => self.infer_app(env, expr, func, arg),
        }
    }

    fn infer_var(&self, env: &Env, expr: &Expr, name: &str) -> Result<Derivation, InferError> {
        let Some(((bound, value), parent)) = env.top().zip(env.pop()) else {
            return Err(InferError::UnboundVariable {
                name: name.to_string(),
            });
        };

        if bound == name {
            return Ok(self.axiom(env, expr, value.clone(), "E-Var1"));
        }

        let premise = self.infer_var(&parent, expr, name)?;
        let value = premise.value().clone();
        Ok(self.derivation(env, expr, value, "E-Var2", vec![premise.into()]))
    }

    fn infer_index(&self, env: &Env, expr: &Expr, index: usize) -> Result<Derivation, InferError> {
        let value = env.nth(index).cloned().ok_or(InferError::IndexOutOfRange {
            index,
            depth: env.len(),
        })?;
        Ok(self.axiom(env, expr, value, "E-Var"))
    }

    fn infer_let(
        &self,
        env: &Env,
        expr: &Expr,
        name: &str,
        bound: &Expr,
        body: &Expr,
    ) -> Result<Derivation, InferError> {
        let bound_derivation = self.infer(env, bound)?;
        let body_env = env.push(name, bound_derivation.value().clone());
        let body_derivation = self.infer(&body_env, body)?;
        let value = body_derivation.value().clone();
        Ok(self.derivation(
            env,
            expr,
            value,
            "E-Let",
            vec![bound_derivation.into(), body_derivation.into()],
        ))
    }

    fn infer_let_rec(
        &self,
        env: &Env,
        expr: &Expr,
        name: &str,
        bound: &Expr,
        body: &Expr,
    ) -> Result<Derivation, InferError> {
        let Expr::Fun(function) = bound else {
            return Err(InferError::LetRecNotFunction {
                bound: bound.clone(),
            });
        };
        let closure = Value::RecClosure {
            env: env.clone(),
            name: name.to_string(),
            function: function.clone(),
        };
        let body_derivation = self.infer(&env.push(name, closure), body)?;
        let value = body_derivation.value().clone();
        Ok(self.derivation(env, expr, value, "E-LetRec", vec![body_derivation.into()]))
    }

    fn infer_fun(&self, env: &Env, expr: &Expr, function: &Function) -> Derivation {
        let closure = Value::Closure {
            env: env.clone(),
            function: function.clone(),
        };
        self.axiom(env, expr, closure, "E-Fun")
    }

    fn infer_app(
        &self,
        env: &Env,
        expr: &Expr,
        func: &Expr,
        arg: &Expr,
    ) -> Result<Derivation, InferError> {
        let func_derivation = self.infer(env, func)?;
        let arg_derivation = self.infer(env, arg)?;
        let callee = func_derivation.value();
        let rule = match callee {
            Value::RecClosure { .. } => "E-AppRec",
            _ => "E-App",
        };
        let argument = arg_derivation.value().clone();
        let Some((body_env, function)) = enter_closure(callee, argument) else {
            return Err(InferError::NotAFunction {
                value: callee.clone(),
            });
        };
        let body_derivation = self.infer(&body_env, &function.body)?;
        let value = body_derivation.value().clone();
        Ok(self.derivation(
            env,
            expr,
            value,
            rule,
            vec![
                func_derivation.into(),
                arg_derivation.into(),
                body_derivation.into(),
            ],
        ))
    }

    fn infer_binop(
        &self,
        env: &Env,
        expr: &Expr,
        op: BinOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Derivation, InferError> {
        let left_derivation = self.infer(env, left)?;
        if let Some(fault) = OperandFault::of_left(left_derivation.value()) {
            return Ok(self.derivation(
                env,
                expr,
                Value::Error,
                operand_rule(op, fault),
                vec![left_derivation.into()],
            ));
        }
        let Some(left_int) = left_derivation.value().as_int() else {
            return Err(InferError::ClosureOperand { op });
        };

        // The right operand is never looked at unless the left one is an integer.
        let right_derivation = self.infer(env, right)?;
        if let Some(fault) = OperandFault::of_right(right_derivation.value()) {
            return Ok(self.derivation(
                env,
                expr,
                Value::Error,
                operand_rule(op, fault),
                vec![right_derivation.into()],
            ));
        }
        let Some(right_int) = right_derivation.value().as_int() else {
            return Err(InferError::ClosureOperand { op });
        };

        let fact = ArithFact::compute(op, left_int, right_int).ok_or(InferError::Overflow {
            op,
            left: left_int,
            right: right_int,
        })?;
        Ok(self.derivation(
            env,
            expr,
            fact.result_value(),
            operator_rule(op),
            vec![left_derivation.into(), right_derivation.into(), fact.into()],
        ))
    }

    fn infer_if(
        &self,
        env: &Env,
        expr: &Expr,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> Result<Derivation, InferError> {
        let condition_derivation = self.infer(env, condition)?;
        let taken = match condition_derivation.value() {
            Value::Bool(taken) => *taken,
            Value::Error => {
                return Ok(self.derivation(
                    env,
                    expr,
                    Value::Error,
                    "E-IfError",
                    vec![condition_derivation.into()],
                ))
            }
            Value::Int(_) => {
                return Ok(self.derivation(
                    env,
                    expr,
                    Value::Error,
                    "E-IfInt",
                    vec![condition_derivation.into()],
                ))
            }
            Value::Closure { .. } | Value::RecClosure { .. } => {
                return Err(InferError::ClosureCondition)
            }
        };

        let branch = if taken { then_branch } else { else_branch };
        let branch_derivation = self.infer(env, branch)?;
        let value = branch_derivation.value().clone();
        let rule = match (taken, &value) {
            (true, Value::Error) => "E-IfTError",
            (true, _) => "E-IfT",
            (false, Value::Error) => "E-IfFError",
            (false, _) => "E-IfF",
        };
        Ok(self.derivation(
            env,
            expr,
            value,
            rule,
            vec![condition_derivation.into(), branch_derivation.into()],
        ))
    }

    fn axiom(&self, env: &Env, expr: &Expr, value: Value, rule: &'static str) -> Derivation {
        self.derivation(env, expr, value, rule, Vec::new())
    }

    fn derivation(
        &self,
        env: &Env,
        expr: &Expr,
        value: Value,
        rule: &'static str,
        premises: Vec<Premise>,
    ) -> Derivation {
        let env = if self.bare && env.is_empty() {
            None
        } else {
            Some(env.clone())
        };
        Derivation::new(Judgment::new(env, expr.clone(), value), rule, premises)
    }
}
