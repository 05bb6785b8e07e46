// tests/parser_tests.rs

use rust_decimal::Decimal;
use sift_ql::ast::{Aggregation, BoolOp, Expr, Limit, Query};
use sift_ql::error::SyntaxError;
use sift_ql::lexer::Lexer;
use sift_ql::parser::Parser;

fn parse(input: &str) -> Result<Query, SyntaxError> {
    Parser::new(Lexer::new(input).tokenize()).parse()
}

fn parse_ok(input: &str) -> Query {
    parse(input).unwrap_or_else(|e| panic!("parse failed for {input:?}: {e}"))
}

fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

// ============================================================================
// Clause basics
// ============================================================================

#[test]
fn test_empty_query_is_legal() {
    let query = parse_ok("");
    assert!(query.select.is_none());
    assert!(query.filter.is_none());
    assert!(query.aggregate.is_none());
    assert!(query.sort.is_none());
    assert!(query.limit.is_none());
}

#[test]
fn test_select_field_list() {
    let query = parse_ok("SELECT name, credit_limit, risk");
    let select = query.select.unwrap();
    assert_eq!(select.fields, vec!["name", "credit_limit", "risk"]);
}

#[test]
fn test_single_predicate() {
    let query = parse_ok("WHERE risk.equals(Low)");
    assert_eq!(
        query.filter.unwrap(),
        Expr::MethodCall {
            field: "risk".to_string(),
            method: "equals".to_string(),
            args: vec!["Low".to_string()],
        }
    );
}

#[test]
fn test_predicate_with_multiple_args() {
    let query = parse_ok("WHERE region.in(EMEA, APAC, 42)");
    let Expr::MethodCall { args, .. } = query.filter.unwrap() else {
        panic!("expected method call");
    };
    assert_eq!(args, vec!["EMEA", "APAC", "42"]);
}

#[test]
fn test_predicate_with_no_args() {
    let query = parse_ok("WHERE risk.equals()");
    let Expr::MethodCall { args, .. } = query.filter.unwrap() else {
        panic!("expected method call");
    };
    assert!(args.is_empty());
}

// ============================================================================
// Boolean precedence
// ============================================================================

#[test]
fn test_or_binds_looser_than_and() {
    // a AND b OR c => Or(And(a, b), c)
    let query = parse_ok("WHERE a.equals(1) AND b.equals(2) OR c.equals(3)");
    let Expr::Binary { left, op, right } = query.filter.unwrap() else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BoolOp::Or);
    assert!(matches!(
        *left,
        Expr::Binary {
            op: BoolOp::And,
            ..
        }
    ));
    assert!(matches!(*right, Expr::MethodCall { ref field, .. } if field == "c"));
}

#[test]
fn test_parentheses_override_precedence() {
    // a AND (b OR c) => And(a, Or(b, c))
    let query = parse_ok("WHERE a.equals(1) AND (b.equals(2) OR c.equals(3))");
    let Expr::Binary { left, op, right } = query.filter.unwrap() else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BoolOp::And);
    assert!(matches!(*left, Expr::MethodCall { .. }));
    assert!(matches!(*right, Expr::Binary { op: BoolOp::Or, .. }));
}

#[test]
fn test_chained_and_is_left_associative() {
    let query = parse_ok("WHERE a.equals(1) AND b.equals(2) AND c.equals(3)");
    let Expr::Binary { left, op, .. } = query.filter.unwrap() else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BoolOp::And);
    assert!(matches!(*left, Expr::Binary { op: BoolOp::And, .. }));
}

// ============================================================================
// Sort
// ============================================================================

#[test]
fn test_sort_defaults_to_ascending() {
    let query = parse_ok("SORT credit_limit");
    let sort = query.sort.unwrap();
    assert_eq!(sort.fields.len(), 1);
    assert_eq!(sort.fields[0].field, "credit_limit");
    assert!(sort.fields[0].ascending);
}

#[test]
fn test_sort_multiple_fields_with_directions() {
    let query = parse_ok("SORT region ASC, credit_limit DESC, name");
    let sort = query.sort.unwrap();
    let directions: Vec<(&str, bool)> = sort
        .fields
        .iter()
        .map(|f| (f.field.as_str(), f.ascending))
        .collect();
    assert_eq!(
        directions,
        vec![("region", true), ("credit_limit", false), ("name", true)]
    );
}

// ============================================================================
// Limit
// ============================================================================

#[test]
fn test_limit_single_argument_is_size() {
    let query = parse_ok("LIMIT 10");
    assert_eq!(query.limit.unwrap(), Limit { offset: 0, size: 10 });
}

#[test]
fn test_limit_two_arguments_are_offset_and_size() {
    let query = parse_ok("LIMIT 5,10");
    assert_eq!(query.limit.unwrap(), Limit { offset: 5, size: 10 });
}

#[test]
fn test_limit_rejects_malformed_number() {
    // "1.2.3" lexes as one number token; the parser rejects it here
    let err = parse("LIMIT 1.2.3").unwrap_err();
    assert!(err.expected.contains("integer"), "{err}");
}

// ============================================================================
// Aggregate
// ============================================================================

#[test]
fn test_stats_aggregation() {
    let query = parse_ok("AGGREGATE stats(credit_limit)");
    assert_eq!(
        query.aggregate.unwrap(),
        vec![Aggregation::Stats {
            field: "credit_limit".to_string()
        }]
    );
}

#[test]
fn test_range_aggregation_with_open_ends() {
    let query = parse_ok(
        "AGGREGATE range(credit_limit, [{to: 50000}, {from: 50000, to: 150000}, {from: 150000}])",
    );
    let Some(Aggregation::Range { field, buckets, nested }) =
        query.aggregate.unwrap().into_iter().next()
    else {
        panic!("expected range aggregation");
    };
    assert_eq!(field, "credit_limit");
    assert!(nested.is_empty());
    assert_eq!(buckets.len(), 3);
    assert_eq!((buckets[0].from, buckets[0].to), (None, Some(dec(50000))));
    assert_eq!(
        (buckets[1].from, buckets[1].to),
        (Some(dec(50000)), Some(dec(150000)))
    );
    assert_eq!((buckets[2].from, buckets[2].to), (Some(dec(150000)), None));
}

#[test]
fn test_term_aggregation() {
    let query = parse_ok("AGGREGATE term(region, 3)");
    assert_eq!(
        query.aggregate.unwrap(),
        vec![Aggregation::Term {
            field: "region".to_string(),
            size: 3,
            nested: vec![],
        }]
    );
}

#[test]
fn test_percentiles_aggregation() {
    let query = parse_ok("AGGREGATE percentiles(credit_limit, [50, 95, 99.9])");
    let Some(Aggregation::Percentiles { field, percentiles }) =
        query.aggregate.unwrap().into_iter().next()
    else {
        panic!("expected percentiles aggregation");
    };
    assert_eq!(field, "credit_limit");
    assert_eq!(percentiles.len(), 3);
    assert_eq!(percentiles[2].to_string(), "99.9");
}

#[test]
fn test_aggregation_kind_matches_any_case() {
    let query = parse_ok("AGGREGATE TERM(region, 2), Stats(credit_limit)");
    assert_eq!(query.aggregate.unwrap().len(), 2);
}

#[test]
fn test_nested_aggregations() {
    let query =
        parse_ok("AGGREGATE term(region, 5) { stats(credit_limit), term(risk, 3) { stats(credit_limit) } }");
    let Some(Aggregation::Term { nested, .. }) = query.aggregate.unwrap().into_iter().next()
    else {
        panic!("expected term aggregation");
    };
    assert_eq!(nested.len(), 2);
    let Aggregation::Term { nested: inner, .. } = &nested[1] else {
        panic!("expected inner term aggregation");
    };
    assert_eq!(inner.len(), 1);
}

#[test]
fn test_unknown_aggregation_kind_is_rejected() {
    let err = parse("AGGREGATE histogram(credit_limit)").unwrap_err();
    assert!(err.expected.contains("aggregation kind"), "{err}");
    assert_eq!(err.found, "'histogram'");
}

// ============================================================================
// Leniency and clause repetition
// ============================================================================

#[test]
fn test_unknown_top_level_tokens_are_skipped() {
    // Stray tokens outside a clause are ignored, not an error
    let query = parse_ok("# ] WHERE risk.equals(Low) ~~");
    assert!(query.filter.is_some());
}

#[test]
fn test_repeated_where_last_wins() {
    let query = parse_ok("WHERE risk.equals(Low) WHERE risk.equals(High)");
    let Expr::MethodCall { args, .. } = query.filter.unwrap() else {
        panic!("expected method call");
    };
    assert_eq!(args, vec!["High"]);
}

#[test]
fn test_repeated_limit_last_wins() {
    let query = parse_ok("LIMIT 10 LIMIT 3,7");
    assert_eq!(query.limit.unwrap(), Limit { offset: 3, size: 7 });
}

#[test]
fn test_clause_order_does_not_matter_for_parsing() {
    let query = parse_ok("LIMIT 5 WHERE risk.equals(Low) SORT name");
    assert!(query.filter.is_some());
    assert!(query.sort.is_some());
    assert_eq!(query.limit.unwrap().size, 5);
}

// ============================================================================
// Errors carry position
// ============================================================================

#[test]
fn test_missing_closing_paren() {
    let err = parse("WHERE risk.equals(Low").unwrap_err();
    assert_eq!(err.expected, "',' or ')'");
    assert_eq!(err.found, "end of input");
}

#[test]
fn test_missing_method_after_dot() {
    let err = parse("WHERE risk.(Low)").unwrap_err();
    assert_eq!(err.expected, "method name");
    assert_eq!(err.found, "'('");
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 12);
}

#[test]
fn test_error_location_spans_lines() {
    let err = parse("WHERE\n  risk.equals(Low) AND\n  .contains(x)").unwrap_err();
    assert_eq!(err.line, 3);
    assert_eq!(err.column, 3);
    assert_eq!(err.expected, "field name or '('");
}

#[test]
fn test_sort_requires_field_name() {
    let err = parse("SORT 42").unwrap_err();
    assert_eq!(err.expected, "sort field name");
    assert_eq!(err.found, "'42'");
}
