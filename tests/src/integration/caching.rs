//! # Engine Caching Flows
//!
//! Queries through the computation engine against state that arrived via
//! the real ingest path: reuse of cached values, invalidation by later
//! events, and range sampling shape.

#[cfg(test)]
mod tests {
    use crate::support::{bank_line, wasm_line, Pipeline};
    use ch_03_formulas::{FormulaArgs, FormulaKind};
    use ch_04_computation::{ComputeError, RangeBounds};
    use serde_json::json;
    use shared_types::ValidationError;

    fn denom_args() -> FormulaArgs {
        let mut args = FormulaArgs::new();
        args.insert("denom".into(), json!("uhist"));
        args
    }

    #[tokio::test]
    async fn range_by_time_returns_one_sample_per_block() {
        let pipeline = Pipeline::new();
        let input = format!(
            "{}\n{}\n{}\n",
            bank_line("historian1abc", "uhist", 100, 1),
            bank_line("historian1abc", "uhist", 200, 2),
            bank_line("historian1abc", "uhist", 300, 3),
        );
        pipeline.run_stream(&input).await;

        let samples = pipeline
            .engine()
            .compute_range(
                FormulaKind::Wallet,
                "balance",
                "historian1abc",
                &denom_args(),
                RangeBounds::Times {
                    start: 1000,
                    end: 3000,
                    step: 1000,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            samples
                .iter()
                .map(|s| (s.block_height, s.block_time_unix_ms, s.value.clone()))
                .collect::<Vec<_>>(),
            vec![
                (1, 1000, json!("100")),
                (2, 2000, json!("200")),
                (3, 3000, json!("300")),
            ]
        );
    }

    #[tokio::test]
    async fn block_range_sample_count_follows_the_step() {
        let pipeline = Pipeline::new();
        pipeline
            .run_stream(&format!("{}\n", bank_line("historian1abc", "uhist", 100, 1)))
            .await;

        // (end - start) / step + 1 samples.
        for (start, end, step, expected) in [(1u64, 9u64, 2i64, 5usize), (1, 1, 1, 1), (3, 7, 5, 1)]
        {
            let samples = pipeline
                .engine()
                .compute_range(
                    FormulaKind::Wallet,
                    "balance",
                    "historian1abc",
                    &denom_args(),
                    RangeBounds::Blocks { start, end, step },
                )
                .await
                .unwrap();
            assert_eq!(samples.len(), expected);
        }
    }

    #[tokio::test]
    async fn repeated_queries_agree_with_the_first() {
        let pipeline = Pipeline::new();
        pipeline
            .run_stream(&format!("{}\n", bank_line("historian1abc", "uhist", 150, 1)))
            .await;

        let cold = pipeline
            .engine()
            .compute_at_height(
                FormulaKind::Wallet,
                "balance",
                "historian1abc",
                &denom_args(),
                5,
            )
            .await
            .unwrap();
        let warm = pipeline
            .engine()
            .compute_at_height(
                FormulaKind::Wallet,
                "balance",
                "historian1abc",
                &denom_args(),
                5,
            )
            .await
            .unwrap();
        assert_eq!(cold, json!("150"));
        assert_eq!(cold, warm);
    }

    #[tokio::test]
    async fn later_event_for_the_same_key_invalidates_the_cache() {
        let pipeline = Pipeline::new();
        pipeline
            .run_stream(&format!("{}\n", bank_line("historian1abc", "uhist", 100, 1)))
            .await;

        let at_2 = pipeline
            .engine()
            .compute_at_height(
                FormulaKind::Wallet,
                "balance",
                "historian1abc",
                &denom_args(),
                2,
            )
            .await
            .unwrap();
        assert_eq!(at_2, json!("100"));

        // More stream arrives: the same account changes at height 5.
        pipeline
            .ingest(&format!("{}\n", bank_line("historian1abc", "uhist", 700, 5)))
            .await;
        pipeline.drain().await;

        let at_9 = pipeline
            .engine()
            .compute_at_height(
                FormulaKind::Wallet,
                "balance",
                "historian1abc",
                &denom_args(),
                9,
            )
            .await
            .unwrap();
        assert_eq!(at_9, json!("700"));
    }

    #[tokio::test]
    async fn query_ahead_of_the_head_refreshes_once_history_catches_up() {
        let pipeline = Pipeline::new();
        pipeline
            .run_stream(&format!("{}\n", bank_line("historian1abc", "uhist", 100, 1)))
            .await;

        // Height 10 is past the indexed head: clamps to block 1.
        let early = pipeline
            .engine()
            .compute_at_height(
                FormulaKind::Wallet,
                "balance",
                "historian1abc",
                &denom_args(),
                10,
            )
            .await
            .unwrap();
        assert_eq!(early, json!("100"));

        // The stream catches up with a change below the queried height.
        pipeline
            .run_stream(&format!("{}\n", bank_line("historian1abc", "uhist", 999, 5)))
            .await;

        let caught_up = pipeline
            .engine()
            .compute_at_height(
                FormulaKind::Wallet,
                "balance",
                "historian1abc",
                &denom_args(),
                10,
            )
            .await
            .unwrap();
        assert_eq!(caught_up, json!("999"));
    }

    #[tokio::test]
    async fn contract_query_sees_only_state_at_or_before_the_block() {
        let pipeline = Pipeline::new();
        let input = format!(
            "{}\n{}\n",
            wasm_line("historian1contract", "config", "v1", 2),
            wasm_line("historian1contract", "config", "v2", 6),
        );
        pipeline.run_stream(&input).await;

        let mut args = FormulaArgs::new();
        args.insert("key".into(), json!("config"));
        let at_4 = pipeline
            .engine()
            .compute_at_height(
                FormulaKind::Contract,
                "item",
                "historian1contract",
                &args,
                4,
            )
            .await
            .unwrap();
        assert_eq!(at_4, json!("v1"));
    }

    #[tokio::test]
    async fn missing_required_argument_fails_before_evaluation() {
        let pipeline = Pipeline::new();
        pipeline
            .run_stream(&format!("{}\n", wasm_line("historian1contract", "config", "v1", 1)))
            .await;

        let err = pipeline
            .engine()
            .compute_at_height(
                FormulaKind::Contract,
                "item",
                "historian1contract",
                &FormulaArgs::new(),
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ComputeError::Validation(ValidationError::MissingArgument(ref name)) if name == "key"
        ));
        assert!(err.is_client_error());
    }
}
