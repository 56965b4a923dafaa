use dosimetria::{cascade, Rule};

#[test]
fn range_rule_years_converts_low_bound() {
    assert_eq!(cascade("pena de 2 a 8 anos"), Some((24, Rule::Range)));
}

#[test]
fn range_rule_months_kept_unconverted() {
    assert_eq!(cascade("detenção, de 6 a 18 meses"), Some((6, Rule::Range)));
}

#[test]
fn range_rule_accepts_ate_separator() {
    assert_eq!(cascade("de 1 até 3 anos"), Some((12, Rule::Range)));
}

#[test]
fn range_rule_accepts_dash_separator() {
    assert_eq!(cascade("2 - 5 anos"), Some((24, Rule::Range)));
}

#[test]
fn range_rule_singular_year() {
    assert_eq!(cascade("de 1 a 1 ano"), Some((12, Rule::Range)));
}

#[test]
fn anchored_rule_indicator_near_digits() {
    assert_eq!(cascade("reclusão, de 2 anos"), Some((24, Rule::Anchored)));
    assert_eq!(cascade("pena de 3 meses"), Some((3, Rule::Anchored)));
}

#[test]
fn anchored_rule_diacritic_unit() {
    assert_eq!(cascade("detenção de 1 mês"), Some((1, Rule::Anchored)));
}

#[test]
fn anchored_gap_limit_falls_through_to_generic() {
    let win = format!("pena {} 5 anos", "x".repeat(60));
    assert_eq!(cascade(&win), Some((60, Rule::Generic)));
}

#[test]
fn generic_rule_matches_bare_digits_and_unit() {
    assert_eq!(cascade("cerca de 8 meses depois"), Some((8, Rule::Generic)));
}

#[test]
fn first_matching_rule_wins_within_a_window() {
    // generic would see "10 meses" first, but the range rule outranks it
    assert_eq!(
        cascade("10 meses depois, condenado de 2 a 8 anos"),
        Some((24, Rule::Range))
    );
}

#[test]
fn zero_low_bound_is_a_valid_candidate() {
    assert_eq!(cascade("de 0 a 2 anos"), Some((0, Rule::Range)));
}

#[test]
fn no_rule_matches_yields_nothing() {
    assert_eq!(cascade("nenhuma sancao prevista aqui"), None);
}

#[test]
fn overflowing_values_are_silent_misses() {
    assert_eq!(cascade("400000000 a 500000000 anos"), None);
}
