use outrights::markets::{format_payoff, parse_payoff};

#[test]
fn twenty_team_grammar_example() {
    let payoff = parse_payoff("1|4x0.25|15x0").unwrap();
    assert_eq!(payoff.len(), 20);
    assert_eq!(payoff[0], 1.0);
    assert_eq!(payoff[1], 0.25);
    assert_eq!(payoff[4], 0.25);
    assert_eq!(payoff[5], 0.0);
    assert_eq!(payoff[19], 0.0);
}

#[test]
fn grammar_round_trip_preserves_totals() {
    for expression in [
        "1",
        "1|19x0",
        "1|4x0.25|15x0",
        "2x1.5|3x0.75|0.5",
        "-0.5|2x0|1",
    ] {
        let parsed = parse_payoff(expression).unwrap();
        let reparsed = parse_payoff(&format_payoff(&parsed)).unwrap();
        assert_eq!(parsed, reparsed, "round trip changed {expression:?}");
    }
}

#[test]
fn vector_length_is_the_token_count_sum() {
    assert_eq!(parse_payoff("1").unwrap().len(), 1);
    assert_eq!(parse_payoff("1|1").unwrap().len(), 2);
    assert_eq!(parse_payoff("5x2").unwrap().len(), 5);
    assert_eq!(parse_payoff("3x1|2x0|7").unwrap().len(), 6);
}

#[test]
fn junk_expressions_fail() {
    for expression in ["", "|", "1||2", "two", "2x2x2", "-1x3"] {
        assert!(parse_payoff(expression).is_err(), "{expression:?} should fail");
    }
}
