use mathcheck::{
    check_answer, equal, evaluate, Error, EvaluationError, Expr, ParseError,
};
use pretty_assertions::assert_eq;

fn expr(src: &str) -> Expr {
    match evaluate(src) {
        Ok(expr) => expr,
        Err(e) => panic!("Unable to evaluate {:?}: {}", src, e),
    }
}

fn same(left: &str, right: &str) -> bool { equal(&expr(left), &expr(right)) }

#[test]
fn integer_literals_evaluate_to_themselves() {
    let inputs: Vec<i64> = vec![0, 1, 7, 42, 1000, 65536, i64::MAX];

    for n in inputs {
        let got = expr(&n.to_string());
        assert_eq!(got, Expr::integer(n));
    }

    let huge = "123456789012345678901234567890123456789";
    assert_eq!(expr(huge).to_string(), huge);
}

#[test]
fn addition_folds_to_the_literal_sum() {
    let inputs = vec![(0, 0), (1, 2), (17, 25), (999, 1), (123456, 654321)];

    for (a, b) in inputs {
        let src = format!("{}+{}", a, b);
        assert!(same(&src, &(a + b).to_string()), "{}", src);
    }
}

#[test]
fn exponentiation_is_right_associative() {
    assert!(same("2^3^2", "2^9"));
    assert!(same("2^3^2", "512"));
    assert!(!same("2^3^2", "8^2"));
}

#[test]
fn unary_signs_use_parity() {
    assert!(same("--5", "5"));
    assert!(same("---5", "-5"));
}

#[test]
fn multiplication_and_division_are_left_associative() {
    assert!(same("8/2/2", "2"));
    assert!(!same("8/2/2", "8"));
    assert!(same("2*3/4", "3/2"));
}

#[test]
fn function_application() {
    assert!(same("sqrt(9)", "3"));
    assert!(same("sqrt(x)^2", "x"));
}

#[test]
fn floats_need_a_decimal_point() {
    match evaluate("1e5") {
        Err(Error::Parse(_)) => {},
        other => panic!("Expected a parse error, found {:?}", other),
    }

    assert!(same("1.0e5", "100000"));
    assert!(same("1.50", "1.5"));
    assert!(same("0.5", "1/2"));
    assert!(same("0.1 + 0.2", "0.3"));
}

#[test]
fn factoring_is_not_attempted() {
    assert!(!same("x^2-1", "(x-1)*(x+1)"));
    assert!(!same("sin(x)^2 + cos(x)^2", "1"));
}

#[test]
fn simplifications_done_while_building_values() {
    let inputs = vec![
        ("x + x", "2*x"),
        ("x*y", "y*x"),
        ("x*x", "x^2"),
        ("a + b + c", "c + (b + a)"),
        ("2*(x + 1)", "2*x + 2"),
        ("x/x", "1"),
        ("x - x", "0"),
        ("1*x", "x"),
        ("x*sqrt(x*y)*sqrt(x*y)", "x^2*y"),
        ("x*sqrt(x^2)*sqrt(x^2)", "x^3"),
    ];

    for (left, right) in inputs {
        assert!(same(left, right), "{} != {}", left, right);
    }
}

#[test]
fn printed_values_evaluate_to_themselves() {
    let inputs = vec![
        "x*sqrt(x*y)*sqrt(x*y)",
        "y*(x*y)^(1/2)",
        "sqrt(12)*z/3",
        "x*sqrt(x^2)",
    ];

    for src in inputs {
        let original = expr(src);
        let round_tripped = expr(&original.to_string());

        assert_eq!(round_tripped, original, "{}", src);
    }
}

#[test]
fn unknown_functions_are_reported_by_name() {
    assert_eq!(
        evaluate("foo(1)"),
        Err(Error::UnknownFunction { name: "foo".into() })
    );
}

#[test]
fn evaluation_is_deterministic() {
    let inputs = vec!["x^2 + 3*x - sin(y)/2", "1.25*(a - b)", "sqrt(12)"];

    for src in inputs {
        assert_eq!(expr(src), expr(src));
        assert!(same(src, src));
    }
}

#[test]
fn division_by_zero() {
    assert_eq!(
        evaluate("1/0"),
        Err(Error::Evaluation(EvaluationError::DivisionByZero))
    );
    assert_eq!(
        evaluate("x/(y - y)"),
        Err(Error::Evaluation(EvaluationError::DivisionByZero))
    );
}

#[test]
fn deep_nesting_is_rejected() {
    let src = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));

    match evaluate(&src) {
        Err(Error::Parse(ParseError::TooDeeplyNested { .. })) => {},
        other => panic!("Expected a nesting error, found {:?}", other),
    }
}

#[test]
fn grading_answers() {
    assert!(check_answer("1/2", "0.5"));
    assert!(check_answer("2*x + 1", "1 + x*2"));
    assert!(!check_answer("", "1"));
    assert!(!check_answer("1", ""));
    assert!(!check_answer("1", "one("));
    assert!(!check_answer("x^2-1", "(x-1)*(x+1)"));
    assert!(check_answer("x^2*y", "x*sqrt(x*y)*sqrt(x*y)"));
}
