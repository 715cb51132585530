mod derivation;
mod env;
mod evaluator;
mod parser;
mod prover;
mod syntax;

pub use derivation::{ArithFact, Derivation, Judgment, Premise};
pub use env::Env;
pub use evaluator::{evaluate, EvalError};
pub use parser::{
    environment, eval_request, expression, judgment, parse_env_source, parse_eval_source,
    parse_expr_source, parse_judgment_source, parse_value_source, value, ANONYMOUS_BINDER,
    KEYWORDS,
};
pub use prover::{infer, infer_bare, prove_judgment, InferError};
pub use syntax::{BinOp, Expr, Function, OperandFault, Value};

use crate::core::{CheckError, EvalMode};

pub fn prove(source: &str) -> Result<String, CheckError> {
    let judgment = parse_judgment_source(source)?;
    let derivation = prove_judgment(&judgment)?;
    Ok(derivation.to_string())
}

pub fn eval(source: &str, mode: EvalMode) -> Result<Value, CheckError> {
    let (env, expr) = parse_eval_source(source)?;
    let env = env.unwrap_or_default();
    let value = match mode {
        EvalMode::Strict => evaluate(&env, &expr).map_err(|error| error.to_string()),
        EvalMode::ErrorValues => infer(&env, &expr)
            .map(|derivation| derivation.value().clone())
            .map_err(|error| error.to_string()),
    };
    value.map_err(CheckError::rule_violation)
}
