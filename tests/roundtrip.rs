// Only the round-trip property sees functions and `let rec`; the others
// need programs that terminate.

use proptest::prelude::*;

use evalto::ml::{evaluate, infer_bare, parse_expr_source, BinOp, Env, Expr};

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("x"), Just("y"), Just("z"), Just("f")].prop_map(str::to_string)
}

fn arb_op() -> impl Strategy<Value = BinOp> {
    prop_oneof![
        Just(BinOp::Plus),
        Just(BinOp::Minus),
        Just(BinOp::Times),
        Just(BinOp::Lt),
    ]
}

fn arb_leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (-50i64..50).prop_map(Expr::Int),
        any::<bool>().prop_map(Expr::Bool),
        Just(Expr::Error),
        arb_name().prop_map(Expr::Var),
    ]
}

fn arb_first_order(max_depth: u32) -> impl Strategy<Value = Expr> {
    arb_leaf().prop_recursive(max_depth, 48, 3, |inner| {
        prop_oneof![
            (arb_op(), inner.clone(), inner.clone())
                .prop_map(|(op, left, right)| Expr::binop(op, left, right)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| Expr::if_then_else(c, t, e)),
            (arb_name(), inner.clone(), inner.clone())
                .prop_map(|(name, bound, body)| Expr::let_in(name, bound, body)),
        ]
    })
}

fn arb_expr(max_depth: u32) -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![arb_leaf(), (1usize..4).prop_map(Expr::Index)];
    leaf.prop_recursive(max_depth, 64, 3, |inner| {
        prop_oneof![
            (arb_op(), inner.clone(), inner.clone())
                .prop_map(|(op, left, right)| Expr::binop(op, left, right)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| Expr::if_then_else(c, t, e)),
            (arb_name(), inner.clone(), inner.clone())
                .prop_map(|(name, bound, body)| Expr::let_in(name, bound, body)),
            (arb_name(), arb_name(), inner.clone(), inner.clone()).prop_map(
                |(name, param, body, rest)| Expr::let_rec(name, Expr::fun(param, body), rest)
            ),
            (arb_name(), inner.clone()).prop_map(|(param, body)| Expr::fun(param, body)),
            (inner.clone(), inner.clone()).prop_map(|(func, arg)| Expr::app(func, arg)),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn display_then_parse_is_identity(expr in arb_expr(5)) {
        let text = expr.to_string();
        let parsed = parse_expr_source(&text);
        prop_assert_eq!(parsed.as_ref(), Ok(&expr), "display was: {}", text);
    }

    #[test]
    fn inference_is_deterministic(expr in arb_first_order(5)) {
        prop_assert_eq!(infer_bare(&expr), infer_bare(&expr));
    }

    #[test]
    fn derivation_agrees_with_strict_evaluation(expr in arb_first_order(5)) {
        if let Ok(value) = evaluate(&Env::new(), &expr) {
            let derivation = infer_bare(&expr);
            prop_assert_eq!(derivation.map(|d| d.value().clone()), Ok(value));
        }
    }
}

#[test]
fn display_keeps_parens_that_change_the_parse() {
    let cases = [
        "8 - (2 - 3)",
        "f (g x)",
        "(fun x -> x) 1",
        "1 + (if true then 2 else 3)",
        "f (-1)",
        "-1 - -2",
        "let rec f = fun x -> f x in f",
    ];
    for source in cases {
        let expr = parse_expr_source(source).expect("case should parse");
        assert_eq!(expr.to_string(), source);
    }
}
