// ABOUTME: Integration tests for the strategy compiler token grammar.
// ABOUTME: Covers the pause/wait/ratio parsers and order preservation.

use caravel::strategy::{CanaryStep, PauseStep, WaitDuration, compile_strategy};

mod grammar {
    use super::*;
    use caravel::strategy::{Strategy, StrategyError};

    fn canary(tokens: &[&str]) -> Result<Vec<CanaryStep>, StrategyError> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        match compile_strategy("canary", &tokens)? {
            Strategy::Canary { steps } => Ok(steps),
            other => panic!("expected canary strategy, got {other:?}"),
        }
    }

    #[test]
    fn ratio_boundaries_succeed() {
        assert_eq!(
            canary(&["ratio{0}"]).unwrap(),
            vec![CanaryStep::SetWeight { percent: 0 }]
        );
        assert_eq!(
            canary(&["ratio{100}"]).unwrap(),
            vec![CanaryStep::SetWeight { percent: 100 }]
        );
    }

    #[test]
    fn ratio_rejects_out_of_range_and_non_numeric() {
        assert!(canary(&["ratio{105}"]).is_err());
        assert!(canary(&["ratio{-1}"]).is_err());
        assert!(canary(&["ratio{abc}"]).is_err());
    }

    #[test]
    fn wait_numeric_defaults_to_seconds() {
        assert_eq!(
            canary(&["wait{10}"]).unwrap(),
            vec![CanaryStep::Wait {
                duration: WaitDuration::Seconds(10)
            }]
        );
    }

    #[test]
    fn wait_with_unit_is_a_duration_string() {
        assert_eq!(
            canary(&["wait{10m}"]).unwrap(),
            vec![CanaryStep::Wait {
                duration: WaitDuration::Spec("10m".to_string())
            }]
        );
    }

    #[test]
    fn wait_with_unrecognized_unit_fails() {
        assert!(canary(&["wait{10x}"]).is_err());
    }

    #[test]
    fn bare_pause_waits_for_approval() {
        assert_eq!(
            canary(&["pause"]).unwrap(),
            vec![CanaryStep::Pause(PauseStep::until_approved())]
        );
    }

    #[test]
    fn unknown_tokens_are_rejected_not_dropped() {
        let err = canary(&["pause", "sleep{10}"]).unwrap_err();
        assert_eq!(
            err,
            StrategyError::UnknownToken("sleep{10}".to_string())
        );
    }

    #[test]
    fn step_count_matches_token_count() {
        let steps = canary(&["ratio{10}", "wait{5}", "pause", "ratio{50}", "ratio{100}"]).unwrap();
        assert_eq!(steps.len(), 5);
    }

    #[test]
    fn wire_shape_of_each_step_kind() {
        let steps = canary(&["ratio{25}", "pause", "wait{10m}", "wait{30}"]).unwrap();
        let json = serde_json::to_value(&steps).unwrap();
        assert_eq!(json[0], serde_json::json!({"setWeight": {"percent": 25}}));
        assert_eq!(json[1], serde_json::json!({"pause": {"untilApproved": true}}));
        assert_eq!(json[2], serde_json::json!({"wait": {"duration": "10m"}}));
        assert_eq!(json[3], serde_json::json!({"wait": {"duration": 30}}));
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn token() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("pause".to_string()),
            (0u64..10_000u64).prop_map(|n| format!("wait{{{n}}}")),
            (1u64..1_000u64, prop_oneof![Just('h'), Just('m'), Just('s')])
                .prop_map(|(n, unit)| format!("wait{{{n}{unit}}}")),
            (0i64..=100i64).prop_map(|n| format!("ratio{{{n}}}")),
        ]
    }

    proptest! {
        #[test]
        fn valid_sequences_preserve_order_and_count(
            tokens in proptest::collection::vec(token(), 0..12)
        ) {
            let compiled = compile_strategy("canary", &tokens).unwrap();
            let caravel::strategy::Strategy::Canary { steps } = compiled else {
                panic!("expected canary strategy");
            };
            prop_assert_eq!(steps.len(), tokens.len());

            for (token, step) in tokens.iter().zip(&steps) {
                let kind_matches = match step {
                    CanaryStep::Pause(_) => token == "pause",
                    CanaryStep::SetWeight { .. } => token.starts_with("ratio{"),
                    CanaryStep::Wait { .. } => token.starts_with("wait{"),
                };
                prop_assert!(kind_matches, "token {} compiled to {:?}", token, step);
            }
        }

        #[test]
        fn ratios_above_100_always_fail(value in 101i64..100_000i64) {
            let token = format!("ratio{{{value}}}");
            prop_assert!(compile_strategy("canary", &[token]).is_err());
        }

        #[test]
        fn ratios_in_range_always_succeed(value in 0i64..=100i64) {
            let token = format!("ratio{{{value}}}");
            prop_assert!(compile_strategy("canary", &[token]).is_ok());
        }
    }
}
