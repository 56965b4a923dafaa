use dosimetria::{compute_sentence, SentenceFactors};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn no_factors_keeps_the_minimum() {
    let b = compute_sentence(12, &SentenceFactors::default());
    assert!(approx(b.base_months, 12.0));
    assert!(approx(b.final_months, 12.0));
    assert_eq!(b.years, 1);
    assert_eq!(b.months, 0);
}

#[test]
fn judicial_circumstances_raise_the_base_by_eighths() {
    let f = SentenceFactors { judicial_circumstances: 2, ..Default::default() };
    let b = compute_sentence(12, &f);
    assert!(approx(b.base_months, 15.0));
}

#[test]
fn aggravating_and_attenuating_adjust_by_sixths() {
    let f = SentenceFactors { aggravating: 1, ..Default::default() };
    assert!(approx(compute_sentence(12, &f).intermediate_months, 14.0));

    let f = SentenceFactors { attenuating: 1, ..Default::default() };
    assert!(approx(compute_sentence(12, &f).intermediate_months, 10.0));
}

#[test]
fn percentage_phase_applies_last() {
    let f = SentenceFactors { increase_pct: 50.0, ..Default::default() };
    assert!(approx(compute_sentence(12, &f).final_months, 18.0));

    let f = SentenceFactors { decrease_pct: 25.0, ..Default::default() };
    assert!(approx(compute_sentence(12, &f).final_months, 9.0));
}

#[test]
fn final_sentence_never_goes_negative() {
    let f = SentenceFactors { attenuating: 12, ..Default::default() };
    let b = compute_sentence(12, &f);
    assert!(approx(b.final_months, 0.0));
    assert_eq!(b.years, 0);
    assert_eq!(b.months, 0);
}

#[test]
fn years_and_months_breakdown() {
    let b = compute_sentence(30, &SentenceFactors::default());
    assert_eq!(b.years, 2);
    assert_eq!(b.months, 6);
}
