use ffilter::prelude::*;
use ffilter::TokenKind;

#[test]
fn comparison_and_membership_build_the_expected_tree() {
    let expr = parse("a == 1 AND b IN (2, 3)").expect("valid filter");

    assert_eq!(
        expr,
        Expr::binary(
            BinaryOp::And,
            Expr::binary(BinaryOp::Eq, Expr::ident("a"), Expr::literal(1)),
            Expr::binary(
                BinaryOp::In,
                Expr::ident("b"),
                Expr::list([Literal::from(2), Literal::from(3)]),
            ),
        )
    );
}

#[test]
fn invalid_filters_report_their_error_class() {
    let cases = [
        ("a IN (1, 'x')", FilterErrorKind::TypeMismatch),
        ("a IN ()", FilterErrorKind::EmptyParentheses),
        ("arr[true]", FilterErrorKind::InvalidIndexType),
        ("a == == b", FilterErrorKind::UnexpectedToken),
        ("a == b c", FilterErrorKind::UnexpectedToken),
        ("a IN (1,)", FilterErrorKind::TrailingComma),
        ("a == 1 AND", FilterErrorKind::UnexpectedEof),
        ("a == 1 # b", FilterErrorKind::InvalidToken),
    ];

    for (text, expected) in cases {
        let error = parse(text).expect_err(text);
        assert_eq!(error.kind, expected, "{text}: {error}");
    }
}

#[test]
fn type_mismatch_points_at_the_offending_element() {
    let error = parse("a IN (1, 'x')").expect_err("mixed list");

    assert_eq!(error.token.kind, TokenKind::String);
    assert_eq!(error.position().column, 10);
    assert!(error.message.contains("line 1, column 10"));
}

#[test]
fn errors_on_later_lines_carry_line_numbers() {
    let error = parse("a == 1\nAND\n  b ==").expect_err("missing operand");

    assert_eq!(error.kind, FilterErrorKind::UnexpectedEof);
    assert_eq!(error.position().line, 3);
}

#[test]
fn rendered_filters_reparse_to_the_same_tree() {
    let filters = [
        "a == 1 AND b IN (2, 3)",
        "(a OR b) AND c",
        "NOT (a == 1 OR b == 2)",
        "NOT NOT flag",
        "x == 1 == true",
        "title LIKE '%it\\'s%' OR body LIKE 'line\\nbreak'",
        "meta['labels'][2] != 'archived'",
        "score >= -1.5 AND score < 10",
        "a OR b AND c OR d",
        "(a == 1)",
        "tags IN ('x') AND ids IN (1) AND flags IN (true, false)",
        "a == 1 OR (b == 2 OR c == 3)",
    ];

    for text in filters {
        let first = parse(text).expect(text);
        let rendered = first.to_string();
        let second = Parser::new(&rendered)
            .parse()
            .unwrap_or_else(|error| panic!("{rendered} failed to reparse: {error}"));
        assert_eq!(first, second, "{text} rendered as {rendered}");
    }
}

#[test]
fn trees_serialize_as_tagged_json() {
    let expr = parse("a == 1").expect("valid filter");

    let json = serde_json::to_value(&expr).expect("serializable");
    assert_eq!(
        json,
        serde_json::json!({
            "node": "binary",
            "op": "eq",
            "left": { "node": "ident", "name": "a" },
            "right": { "node": "literal", "value": {
                "type": "number",
                "value": { "lexeme": "1", "value": 1.0 }
            } }
        })
    );

    let back: Expr = serde_json::from_value(json).expect("deserializable");
    assert_eq!(back, expr);
}

#[test]
fn keywords_are_case_insensitive() {
    let upper = parse("NOT a IN (1) AND b LIKE 'x' OR c == TRUE").expect("upper");
    let lower = parse("not a in (1) and b like 'x' or c == true").expect("lower");
    assert_eq!(upper, lower);
}

#[test]
fn wide_integers_survive_parsing_and_rendering() {
    let expr = parse("id == 12345678901234567890").expect("valid filter");

    let Expr::Binary { right, .. } = &expr else {
        panic!("expected comparison, got {expr:?}");
    };
    let Expr::Literal {
        value: Literal::Number(number),
    } = right.as_ref()
    else {
        panic!("expected number literal, got {right:?}");
    };
    assert_eq!(number.as_u64(), Some(12_345_678_901_234_567_890));
    assert_eq!(expr.to_string(), "id == 12345678901234567890");
    assert_ne!(
        parse("id == 12345678901234567891").expect("valid filter"),
        expr
    );
}
