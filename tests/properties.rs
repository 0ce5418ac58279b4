//! Properties that must hold for any candle series.

mod common;

use market_sentinel::anomaly::{
    assign_severity, build_report, detect_multi_feature_anomalies, detect_pattern_anomalies,
    detect_price_spikes, detect_volatility_anomalies, detect_volume_anomalies, preprocess,
};
use market_sentinel::signal::IndicatorSnapshot;
use market_sentinel::{
    AnomalyFlag, ForestConfig, IndicatorConfig, Series, Severity, Signal, SignalAction,
};
use proptest::prelude::*;

use common::series_from;

/// Positive closes and volumes, between 25 and 80 rows.
fn arb_series() -> impl Strategy<Value = Series> {
    (25usize..80)
        .prop_flat_map(|rows| {
            (
                prop::collection::vec(1.0f64..1_000.0, rows),
                prop::collection::vec(0.0f64..10_000.0, rows),
            )
        })
        .prop_map(|(closes, volumes)| series_from(&closes, &volumes))
}

fn arb_flags(rows: usize) -> impl Strategy<Value = Vec<Vec<bool>>> {
    prop::collection::vec(prop::collection::vec(any::<bool>(), rows), 0..=5)
}

fn arb_snapshot() -> impl Strategy<Value = IndicatorSnapshot> {
    let value = || prop::option::of(-200.0f64..200.0);
    (
        1.0f64..200.0,
        prop::option::of(0.0f64..100.0),
        value(),
        value(),
        value(),
        value(),
        value(),
        value(),
    )
        .prop_map(
            |(close, rsi, macd, macd_signal, sma_short, sma_long, bb_lower, bb_upper)| {
                IndicatorSnapshot {
                    close,
                    rsi,
                    macd,
                    macd_signal,
                    sma_short,
                    sma_long,
                    bb_lower,
                    bb_upper,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pattern_never_flags_warmup_rows(series in arb_series(), window in 2usize..25) {
        let out = detect_pattern_anomalies(&series, window, 2.0).unwrap();
        let flags = out.flag(AnomalyFlag::Pattern).unwrap();
        prop_assert!(flags[..window - 1].iter().all(|f| !f));
    }

    #[test]
    fn detectors_are_idempotent(series in arb_series()) {
        let spikes = detect_price_spikes(&series, 0.05).unwrap();
        prop_assert_eq!(detect_price_spikes(&series, 0.05).unwrap(), spikes);

        let volatility = detect_volatility_anomalies(&series, 20, 3.0).unwrap();
        prop_assert_eq!(detect_volatility_anomalies(&series, 20, 3.0).unwrap(), volatility);

        let volume = detect_volume_anomalies(&series, &ForestConfig::volume()).unwrap();
        prop_assert_eq!(detect_volume_anomalies(&series, &ForestConfig::volume()).unwrap(), volume);

        let pattern = detect_pattern_anomalies(&series, 20, 2.0).unwrap();
        prop_assert_eq!(detect_pattern_anomalies(&series, 20, 2.0).unwrap(), pattern);

        let features = preprocess(&series, 20);
        let multi = detect_multi_feature_anomalies(&features, &ForestConfig::multi_feature()).unwrap();
        prop_assert_eq!(
            detect_multi_feature_anomalies(&features, &ForestConfig::multi_feature()).unwrap(),
            multi
        );
    }

    #[test]
    fn higher_zscore_threshold_flags_subset(
        series in arb_series(),
        low in 0.0f64..3.0,
        extra in 0.0f64..3.0,
    ) {
        let loose = detect_volatility_anomalies(&series, 20, low).unwrap();
        let strict = detect_volatility_anomalies(&series, 20, low + extra).unwrap();
        let loose = loose.flag(AnomalyFlag::Volatility).unwrap();
        let strict = strict.flag(AnomalyFlag::Volatility).unwrap();
        for (l, s) in loose.iter().zip(strict) {
            prop_assert!(!*s || *l);
        }
    }

    #[test]
    fn severity_matches_counts(
        (series, flags) in arb_series().prop_flat_map(|s| {
            let rows = s.len();
            (Just(s), arb_flags(rows))
        })
    ) {
        let mut series = series;
        for (flag, values) in AnomalyFlag::ALL.iter().zip(flags) {
            series = series.with_flag(*flag, values).unwrap();
        }
        let series = assign_severity(&series);

        let counts = series.anomaly_count().unwrap();
        let severity = series.severity().unwrap();
        for (count, level) in counts.iter().zip(severity) {
            prop_assert_eq!(*level == Severity::High, *count > 2);
            prop_assert_eq!(*level == Severity::Normal, *count == 0);
        }

        let report = build_report(&series);
        prop_assert_eq!(report.total_anomalies, report.anomaly_types.values().sum::<usize>());
        prop_assert_eq!(report.total_anomalies, counts.iter().sum::<usize>());
        prop_assert!(report.recent_anomalies.len() <= 10);
    }

    #[test]
    fn signal_score_is_bounded(snapshot in arb_snapshot()) {
        let signal = Signal::from_sub_signals(snapshot.sub_signals(&IndicatorConfig::default()));
        prop_assert!((-5..=5).contains(&signal.score));

        let expected = if signal.score >= 3 {
            SignalAction::Buy
        } else if signal.score <= -3 {
            SignalAction::Sell
        } else {
            SignalAction::Hold
        };
        prop_assert_eq!(signal.action, expected);
        prop_assert!(signal.confidence() <= 5);
    }
}
