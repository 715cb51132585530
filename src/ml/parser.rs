use crate::combinator::{
    alt, delimited, many0, map, map_with_recoverable_exception, opt, preceded, sequence, space0,
    tag, take_while, take_while_m_n, terminated, Parsed, Parser,
};
use crate::core::{CheckError, SourceSpan};

use super::derivation::Judgment;
use super::env::Env;
use super::syntax::{BinOp, Expr, Function, Value};

pub const KEYWORDS: &[&str] = &[
    "let", "rec", "in", "fun", "if", "then", "else", "evalto", "true", "false", "error",
];

pub const ANONYMOUS_BINDER: &str = ".";

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

fn lexeme<'a, T>(parser: impl Parser<'a, T>) -> impl Parser<'a, T> {
    terminated(parser, space0())
}

fn symbol<'a>(text: &'static str) -> impl Parser<'a, &'a str> {
    lexeme(tag(text))
}

fn keyword<'a>(word: &'static str) -> impl Parser<'a, &'a str> {
    lexeme(map_with_recoverable_exception(
        take_while(is_ident_char),
        move |found: &'a str| {
            if found == word {
                Ok(found)
            } else {
                Err(format!("expected '{word}'"))
            }
        },
    ))
}

fn identifier<'a>() -> impl Parser<'a, String> {
    lexeme(map_with_recoverable_exception(
        take_while(is_ident_char),
        |name: &'a str| match name.chars().next() {
            None => Err("expected identifier".to_string()),
            Some(first) if first.is_ascii_digit() => {
                Err(format!("identifier '{name}' starts with a digit"))
            }
            Some(_) if KEYWORDS.contains(&name) => {
                Err(format!("expected identifier, found keyword '{name}'"))
            }
            Some(_) => Ok(name.to_string()),
        },
    ))
}

fn binder<'a>() -> impl Parser<'a, String> {
    alt((identifier(), map(symbol(ANONYMOUS_BINDER), str::to_string)))
}

// Only head positions take a sign, so `f -1` is a subtraction.
fn int_literal<'a>(signed: bool) -> impl Parser<'a, i64> {
    map_with_recoverable_exception(
        lexeme(sequence((
            take_while_m_n(0, usize::from(signed), |c| c == '-'),
            take_while_m_n(1, usize::MAX, |c: char| c.is_ascii_digit()),
            take_while(is_ident_char),
        ))),
        |(sign, digits, tail): (&'a str, &'a str, &'a str)| {
            if !tail.is_empty() {
                return Err(format!("malformed integer literal '{sign}{digits}{tail}'"));
            }
            format!("{sign}{digits}")
                .parse::<i64>()
                .map_err(|_| format!("integer literal '{sign}{digits}' is out of range"))
        },
    )
}

fn bool_literal<'a>() -> impl Parser<'a, bool> {
    alt((
        map(keyword("true"), |_| true),
        map(keyword("false"), |_| false),
    ))
}

fn de_bruijn_index<'a>() -> impl Parser<'a, usize> {
    map_with_recoverable_exception(
        lexeme(sequence((
            tag("#"),
            take_while_m_n(1, usize::MAX, |c: char| c.is_ascii_digit()),
            take_while(is_ident_char),
        ))),
        |(_, digits, tail): (&'a str, &'a str, &'a str)| {
            if !tail.is_empty() {
                return Err(format!("malformed index '#{digits}{tail}'"));
            }
            match digits.parse::<usize>() {
                Ok(0) => Err("indices start at #1".to_string()),
                Ok(index) => Ok(index),
                Err(_) => Err(format!("index '#{digits}' is out of range")),
            }
        },
    )
}

fn parenthesized(input: &str) -> Parsed<'_, Expr> {
    delimited(symbol("("), expression, symbol(")"))(input)
}

fn atom(input: &str) -> Parsed<'_, Expr> {
    alt((
        parenthesized,
        map(int_literal(true), Expr::Int),
        map(bool_literal(), Expr::Bool),
        map(keyword("error"), |_| Expr::Error),
        map(de_bruijn_index(), Expr::Index),
        map(identifier(), Expr::Var),
    ))(input)
}

fn argument(input: &str) -> Parsed<'_, Expr> {
    alt((
        parenthesized,
        map(int_literal(false), Expr::Int),
        map(bool_literal(), Expr::Bool),
        map(keyword("error"), |_| Expr::Error),
        map(de_bruijn_index(), Expr::Index),
        map(identifier(), Expr::Var),
    ))(input)
}

fn application(input: &str) -> Parsed<'_, Expr> {
    map(sequence((atom, many0(argument))), |(head, arguments)| {
        arguments.into_iter().fold(head, Expr::app)
    })(input)
}

fn left_chain<'a>(
    operand: fn(&'a str) -> Parsed<'a, Expr>,
    operator: impl Parser<'a, BinOp>,
) -> impl Parser<'a, Expr> {
    map(
        sequence((operand, many0(sequence((operator, operand))))),
        |(first, rest)| {
            rest.into_iter()
                .fold(first, |left, (op, right)| Expr::binop(op, left, right))
        },
    )
}

fn product(input: &str) -> Parsed<'_, Expr> {
    left_chain(application, map(symbol("*"), |_| BinOp::Times))(input)
}

fn sum(input: &str) -> Parsed<'_, Expr> {
    left_chain(
        product,
        alt((
            map(symbol("+"), |_| BinOp::Plus),
            map(symbol("-"), |_| BinOp::Minus),
        )),
    )(input)
}

fn comparison(input: &str) -> Parsed<'_, Expr> {
    left_chain(sum, map(symbol("<"), |_| BinOp::Lt))(input)
}

fn let_in(input: &str) -> Parsed<'_, Expr> {
    map(
        sequence((
            keyword("let"),
            binder(),
            symbol("="),
            expression,
            keyword("in"),
            expression,
        )),
        |(_, name, _, bound, _, body)| Expr::let_in(name, bound, body),
    )(input)
}

fn let_rec_in(input: &str) -> Parsed<'_, Expr> {
    map(
        sequence((
            keyword("let"),
            keyword("rec"),
            binder(),
            symbol("="),
            expression,
            keyword("in"),
            expression,
        )),
        |(_, _, name, _, bound, _, body)| Expr::let_rec(name, bound, body),
    )(input)
}

fn function_literal(input: &str) -> Parsed<'_, Function> {
    map(
        sequence((keyword("fun"), binder(), symbol("->"), expression)),
        |(_, param, _, body)| Function::new(param, body),
    )(input)
}

fn if_then_else(input: &str) -> Parsed<'_, Expr> {
    map(
        sequence((
            keyword("if"),
            expression,
            keyword("then"),
            expression,
            keyword("else"),
            expression,
        )),
        |(_, condition, _, then_branch, _, else_branch)| {
            Expr::if_then_else(condition, then_branch, else_branch)
        },
    )(input)
}

pub fn expression(input: &str) -> Parsed<'_, Expr> {
    alt((
        let_in,
        let_rec_in,
        map(function_literal, Expr::Fun),
        if_then_else,
        comparison,
    ))(input)
}

fn closure_env(input: &str) -> Parsed<'_, Env> {
    delimited(symbol("("), environment, symbol(")"))(input)
}

fn closure(input: &str) -> Parsed<'_, Value> {
    map(
        sequence((closure_env, symbol("["), function_literal, symbol("]"))),
        |(env, _, function, _)| Value::Closure { env, function },
    )(input)
}

fn rec_closure(input: &str) -> Parsed<'_, Value> {
    map(
        sequence((
            closure_env,
            symbol("["),
            keyword("rec"),
            binder(),
            symbol("="),
            function_literal,
            symbol("]"),
        )),
        |(env, _, _, name, _, function, _)| Value::RecClosure {
            env,
            name,
            function,
        },
    )(input)
}

pub fn value(input: &str) -> Parsed<'_, Value> {
    alt((
        map(int_literal(true), Value::Int),
        map(bool_literal(), Value::Bool),
        map(keyword("error"), |_| Value::Error),
        closure,
        rec_closure,
    ))(input)
}

fn binding(input: &str) -> Parsed<'_, (String, Value)> {
    map(
        sequence((identifier(), symbol("="), value)),
        |(name, _, value)| (name, value),
    )(input)
}

pub fn environment(input: &str) -> Parsed<'_, Env> {
    map(
        opt(sequence((binding, many0(preceded(symbol(","), binding))))),
        |bindings| match bindings {
            None => Env::new(),
            Some((first, rest)) => std::iter::once(first).chain(rest).collect(),
        },
    )(input)
}

pub fn judgment(input: &str) -> Parsed<'_, Judgment> {
    alt((
        map(
            sequence((
                environment,
                symbol("|-"),
                expression,
                keyword("evalto"),
                value,
            )),
            |(env, _, expr, _, value)| Judgment::new(Some(env), expr, value),
        ),
        map(
            sequence((expression, keyword("evalto"), value)),
            |(expr, _, value)| Judgment::new(None, expr, value),
        ),
    ))(input)
}

pub fn eval_request(input: &str) -> Parsed<'_, (Option<Env>, Expr)> {
    alt((
        map(
            sequence((environment, symbol("|-"), expression)),
            |(env, _, expr)| (Some(env), expr),
        ),
        map(expression, |expr| (None, expr)),
    ))(input)
}

pub fn parse_expr_source(source: &str) -> Result<Expr, CheckError> {
    parse_complete(source, expression)
}

pub fn parse_value_source(source: &str) -> Result<Value, CheckError> {
    parse_complete(source, value)
}

pub fn parse_env_source(source: &str) -> Result<Env, CheckError> {
    if source.trim().is_empty() {
        return Ok(Env::new());
    }
    parse_complete(source, environment)
}

pub fn parse_judgment_source(source: &str) -> Result<Judgment, CheckError> {
    parse_complete(source, judgment)
}

pub fn parse_eval_source(source: &str) -> Result<(Option<Env>, Expr), CheckError> {
    parse_complete(source, eval_request)
}

fn parse_complete<'a, T>(source: &'a str, parser: impl Parser<'a, T>) -> Result<T, CheckError> {
    let start = space0()(source).remaining;
    if start.is_empty() {
        return Err(CheckError::parse("input is empty"));
    }

    let parsed = parser(start);
    match parsed.outcome {
        Ok(value) if parsed.remaining.is_empty() => Ok(value),
        Ok(_) => {
            let found = parsed
                .remaining
                .split(char::is_whitespace)
                .next()
                .unwrap_or(parsed.remaining);
            Err(CheckError::parse(format!("expected end of input, found '{found}'"))
                .with_span(span_at(source, parsed.remaining.len())))
        }
        Err(error) => {
            log::debug!("parse failed: {error}");
            Err(CheckError::parse(error.expectations().join(" or "))
                .with_span(span_at(source, error.remaining_len())))
        }
    }
}

fn span_at(source: &str, remaining: usize) -> SourceSpan {
    SourceSpan::locate(source, source.len().saturating_sub(remaining))
}

#[cfg(test)]
mod tests {
    use super::{
        expression, parse_env_source, parse_eval_source, parse_expr_source, parse_judgment_source,
        parse_value_source,
    };
    use crate::core::{CheckErrorKind, SourceSpan};
    use crate::ml::env::Env;
    use crate::ml::syntax::{Expr, Function, Value};

    fn int(value: i64) -> Expr {
        Expr::Int(value)
    }

    #[test]
    fn subtraction_chains_fold_to_the_left() {
        assert_eq!(
            parse_expr_source("8 - 2 - 3").expect("valid expression"),
            Expr::minus(Expr::minus(int(8), int(2)), int(3))
        );
        assert_eq!(
            parse_expr_source("a - b + c").expect("valid expression"),
            Expr::plus(Expr::minus(Expr::var("a"), Expr::var("b")), Expr::var("c"))
        );
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_expr_source("1 + 2 * 3").expect("valid expression"),
            Expr::plus(int(1), Expr::times(int(2), int(3)))
        );
        assert_eq!(
            parse_expr_source("1 + 2 < 3 * 4").expect("valid expression"),
            Expr::lt(Expr::plus(int(1), int(2)), Expr::times(int(3), int(4)))
        );
    }

    #[test]
    fn let_consumes_the_whole_input() {
        let parsed = expression("let x = 1 in x + 1");
        assert_eq!(parsed.remaining, "");
        assert_eq!(
            parsed.into_value(),
            Some(Expr::let_in("x", int(1), Expr::plus(Expr::var("x"), int(1))))
        );
    }

    #[test]
    fn operators_need_no_surrounding_whitespace() {
        assert_eq!(
            parse_expr_source("x-1").expect("valid expression"),
            Expr::minus(Expr::var("x"), int(1))
        );
        assert_eq!(
            parse_expr_source("(1+2)*3").expect("valid expression"),
            Expr::times(Expr::plus(int(1), int(2)), int(3))
        );
    }

    #[test]
    fn negative_literals_only_start_a_term() {
        assert_eq!(
            parse_expr_source("-2 * 3").expect("valid expression"),
            Expr::times(int(-2), int(3))
        );
        assert_eq!(
            parse_expr_source("f -1").expect("valid expression"),
            Expr::minus(Expr::var("f"), int(1))
        );
        assert_eq!(
            parse_expr_source("f (-1)").expect("valid expression"),
            Expr::app(Expr::var("f"), int(-1))
        );
    }

    #[test]
    fn application_is_left_associative_and_tightest() {
        assert_eq!(
            parse_expr_source("f x y + 1").expect("valid expression"),
            Expr::plus(
                Expr::app(Expr::app(Expr::var("f"), Expr::var("x")), Expr::var("y")),
                int(1)
            )
        );
    }

    #[test]
    fn parses_prefix_forms() {
        assert_eq!(
            parse_expr_source("fun x -> x + 1").expect("valid expression"),
            Expr::fun("x", Expr::plus(Expr::var("x"), int(1)))
        );
        assert_eq!(
            parse_expr_source("if x < 2 then error else false").expect("valid expression"),
            Expr::if_then_else(
                Expr::lt(Expr::var("x"), int(2)),
                Expr::Error,
                Expr::Bool(false)
            )
        );
        assert_eq!(
            parse_expr_source("let rec f = fun x -> f x in f 1").expect("valid expression"),
            Expr::let_rec(
                "f",
                Expr::fun("x", Expr::app(Expr::var("f"), Expr::var("x"))),
                Expr::app(Expr::var("f"), int(1))
            )
        );
    }

    #[test]
    fn parses_nameless_binders_and_indices() {
        assert_eq!(
            parse_expr_source("fun . -> #1").expect("valid expression"),
            Expr::fun(".", Expr::Index(1))
        );
        assert_eq!(
            parse_expr_source("#2 + #1").expect("valid expression"),
            Expr::plus(Expr::Index(2), Expr::Index(1))
        );
        let error = parse_expr_source("#0").expect_err("indices are 1-based");
        assert!(error.message().contains("#1"), "{error}");
    }

    #[test]
    fn identifiers_may_extend_keywords() {
        assert_eq!(
            parse_expr_source("letter + iff").expect("valid expression"),
            Expr::plus(Expr::var("letter"), Expr::var("iff"))
        );
        assert_eq!(
            parse_expr_source("x'").expect("valid expression"),
            Expr::var("x'")
        );
    }

    #[test]
    fn keywords_are_not_identifiers() {
        let error = parse_expr_source("let in = 1 in in").expect_err("keyword as binder");
        assert_eq!(error.kind(), CheckErrorKind::Parse);
        assert!(error.message().contains("keyword 'in'"), "{error}");
    }

    #[test]
    fn reports_unconsumed_input_position() {
        let error = parse_expr_source("1 + 2 )").expect_err("stray paren");
        assert!(error.message().contains("end of input"), "{error}");
        assert_eq!(error.span(), Some(&SourceSpan { line: 1, column: 7 }));
    }

    #[test]
    fn reports_the_deepest_failure() {
        let error = parse_expr_source("let x = in 1").expect_err("missing bound expression");
        assert!(error.message().contains("keyword 'in'"), "{error}");
        assert_eq!(error.span(), Some(&SourceSpan { line: 1, column: 9 }));
    }

    #[test]
    fn locates_errors_on_later_lines() {
        let error = parse_expr_source("let x = 1 in\n  x +").expect_err("dangling operator");
        assert_eq!(error.span(), Some(&SourceSpan { line: 2, column: 5 }));
        let error = parse_expr_source("   ").expect_err("blank input");
        assert_eq!(error.message(), "input is empty");
    }

    #[test]
    fn rejects_literals_out_of_range() {
        let error = parse_expr_source("99999999999999999999").expect_err("overflow");
        assert!(error.message().contains("out of range"), "{error}");
        assert_eq!(
            parse_expr_source("-9223372036854775808").expect("i64::MIN fits"),
            int(i64::MIN)
        );
    }

    #[test]
    fn parses_environments_oldest_first() {
        let env = parse_env_source("x = 3, y = true, z = error").expect("valid environment");
        assert_eq!(env.to_string(), "x=3,y=true,z=error");
        assert_eq!(env.lookup("x"), Some(&Value::Int(3)));
        assert!(parse_env_source("").expect("empty environment").is_empty());
    }

    #[test]
    fn parses_judgments_with_and_without_turnstile() {
        let judgment =
            parse_judgment_source("x = 3, y = 2 |- x * y evalto 6").expect("valid judgment");
        assert_eq!(judgment.env.as_ref().map(Env::len), Some(2));
        assert_eq!(judgment.expr, Expr::times(Expr::var("x"), Expr::var("y")));
        assert_eq!(judgment.value, Value::Int(6));

        let judgment = parse_judgment_source("|- 1 evalto 1").expect("valid judgment");
        assert_eq!(judgment.env, Some(Env::new()));

        let judgment = parse_judgment_source("1 + true evalto error").expect("valid judgment");
        assert_eq!(judgment.env, None);
        assert_eq!(judgment.value, Value::Error);
    }

    #[test]
    fn parses_closure_values() {
        let value = parse_value_source("(y=2)[fun x -> x + y]").expect("valid closure");
        assert_eq!(
            value,
            Value::Closure {
                env: Env::new().push("y", Value::Int(2)),
                function: Function::new("x", Expr::plus(Expr::var("x"), Expr::var("y"))),
            }
        );
        assert_eq!(value.to_string(), "(y=2)[fun x -> x + y]");

        let value = parse_value_source("()[rec f = fun x -> f x]").expect("valid closure");
        assert!(matches!(value, Value::RecClosure { ref name, .. } if name == "f"));
        assert_eq!(value.to_string(), "()[rec f = fun x -> f x]");
    }

    #[test]
    fn eval_requests_take_an_optional_environment() {
        let (env, expr) = parse_eval_source("x = 1 |- x").expect("valid request");
        assert_eq!(env.map(|env| env.len()), Some(1));
        assert_eq!(expr, Expr::var("x"));

        let (env, expr) = parse_eval_source("  1 + 2\n").expect("valid request");
        assert_eq!(env, None);
        assert_eq!(expr, Expr::plus(int(1), int(2)));
    }
}
