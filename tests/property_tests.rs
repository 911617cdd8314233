//! Property-based tests using proptest
//! Invariants of the normalizers, the quality filter and the filter engine
use deposit_dynamics::normalize::{parse_currency_text, parse_percentage_text};
use deposit_dynamics::*;
use proptest::prelude::*;

fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn household_strategy() -> impl Strategy<Value = SourcedRecord> {
    (
        prop_oneof![Just("Totals".to_string()), "[0-9]{1,5}"],
        prop_oneof![Just(String::new()), Just("  ".to_string()), "[A-Z][a-z]{2,8}"],
        prop_oneof![Just(0.0), -1_000_000.0..1_000_000.0f64],
        prop_oneof![Just(0.0), -1_000_000.0..1_000_000.0f64],
        prop_oneof![Just(0.0), -1_000_000.0..1_000_000.0f64],
        2usize..500,
    )
        .prop_map(|(id, name, current, prior, year_end, row_number)| SourcedRecord {
            row_number,
            record: HouseholdRecord {
                household_id: id,
                household_name: name,
                officer_code: "1".to_string(),
                officer_name: "Jane Doe".to_string(),
                deposit_to_loans_ratio_current: None,
                deposit_to_loans_ratio_prior: None,
                deposit_to_loans_ratio_ytd: None,
                current_balance: current,
                prior_balance: prior,
                ytd_balance: year_end,
                mom_change: current - prior,
                ytd_change: current - year_end,
            },
        })
}

fn officer_strategy() -> impl Strategy<Value = OfficerMetrics> {
    (
        prop::sample::select(vec![
            "Mark Morrison",
            "Robyn Barrett",
            "Jane Doe",
            "Alex Kim",
            "Jack Korth",
        ]),
        -5_000_000.0..50_000_000.0f64,
        -2_000_000.0..2_000_000.0f64,
        1usize..200,
    )
        .prop_map(|(name, balance, ytd, households)| OfficerMetrics {
            officer_name: name.to_string(),
            officer_code: String::new(),
            total_balance: balance,
            mom_change: 0.0,
            ytd_change: ytd,
            avg_ratio: 0.0,
            household_count: households,
            top_household: String::new(),
        })
}

fn filter_strategy() -> impl Strategy<Value = FilterState> {
    (
        prop_oneof![Just(TopN::All), (1usize..20).prop_map(TopN::Count)],
        prop_oneof![Just(0.0), 0.0..10_000_000.0f64],
        any::<bool>(),
        prop_oneof![
            Just(Scope::All),
            Just(Scope::only("Business Banking")),
            Just(Scope::only("OCF")),
            Just(Scope::only("Personal Banking")),
        ],
    )
        .prop_map(|(top_n, min_balance, exclude_outliers, team)| FilterState {
            top_n,
            min_balance,
            exclude_outliers,
            balance_tier: BalanceTier::All,
            team,
            officer: Scope::All,
        })
}

// Property: normalizers are total and never produce NaN or infinity
proptest! {
    #[test]
    fn currency_parsing_never_panics(text in "\\PC*") {
        prop_assert!(parse_currency_text(&text).is_finite());
    }

    #[test]
    fn percentage_parsing_never_panics(text in "\\PC*") {
        if let Some(value) = parse_percentage_text(&text) {
            prop_assert!(value.is_finite());
        }
    }

    #[test]
    fn parenthesized_amounts_are_negative(n in 0u64..10_000_000_000) {
        let text = format!("$({})", with_thousands(n));
        prop_assert_eq!(parse_currency_text(&text), -(n as f64));
    }

    #[test]
    fn formatted_amounts_round_trip(n in 0u64..10_000_000_000) {
        let text = format!("${}", with_thousands(n));
        prop_assert_eq!(parse_currency_text(&text), n as f64);
    }

    #[test]
    fn formula_errors_are_absent(suffix in "[A-Z0-9/!?]{0,6}") {
        let text = format!("#{}", suffix);
        prop_assert_eq!(parse_percentage_text(&text), None);
    }
}

// Property: the quality filter is idempotent and accounts for every row
proptest! {
    #[test]
    fn quality_filter_is_idempotent(records in prop::collection::vec(household_strategy(), 0..40)) {
        let total = records.len();
        let first = apply_quality_filter(records);
        prop_assert_eq!(first.kept.len() + first.dropped, total);
        prop_assert_eq!(first.findings.len(), first.dropped);

        let second = apply_quality_filter(first.kept.clone());
        prop_assert_eq!(second.dropped, 0);
        prop_assert_eq!(second.kept, first.kept);
    }
}

// Property: the filter engine is pure, deterministic and honors its bounds
proptest! {
    #[test]
    fn officer_filters_are_pure(
        officers in prop::collection::vec(officer_strategy(), 0..30),
        filters in filter_strategy()
    ) {
        let directory = TeamDirectory::default();
        let before = officers.clone();

        let first = apply_officer_filters(&officers, &filters, &directory);
        let second = apply_officer_filters(&officers, &filters, &directory);

        prop_assert_eq!(&officers, &before);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() <= officers.len());
        prop_assert!(first
            .windows(2)
            .all(|pair| pair[0].total_balance >= pair[1].total_balance));

        if let TopN::Count(n) = filters.top_n {
            prop_assert!(first.len() <= n);
        }
        if filters.min_balance > 0.0 {
            prop_assert!(first.iter().all(|o| o.total_balance >= filters.min_balance));
        }
        if let Scope::Only(team) = &filters.team {
            prop_assert!(first
                .iter()
                .all(|o| directory.resolve_team(&o.officer_name) == team));
        }
    }

    #[test]
    fn outlier_bounds_contain_the_quartiles(values in prop::collection::vec(-1e9..1e9f64, 1..50)) {
        let bounds = outlier_threshold(&values, 2.5);
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len() as f64;
        prop_assert!(bounds.contains(sorted[(n * 0.25).floor() as usize]));
        prop_assert!(bounds.contains(sorted[(n * 0.75).floor() as usize]));
    }
}
