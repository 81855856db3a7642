//! # Ingest-to-Store Pipeline Flows
//!
//! The full path: raw trace lines -> ingest worker -> batched exporter ->
//! durable queue -> export consumer -> event store, with retries and
//! downstream fan-out.

#[cfg(test)]
mod tests {
    use crate::support::{bank_line, feegrant_line, FlakyBalanceHandler, Pipeline};
    use ch_02_event_store::{namespace, BalanceEvent, DependableEvent, EventStore};
    use ch_02_event_store::adapters::InMemoryEventStore;
    use ch_05_trace_ingest::{HandlerRegistry, WorkerState};
    use shared_types::U256;
    use std::sync::Arc;

    #[tokio::test]
    async fn stream_lands_typed_events_in_the_store() {
        let pipeline = Pipeline::new();
        let input = format!(
            "{}\n{}\n{}\n",
            bank_line("historian1abc", "uhist", 100, 1),
            feegrant_line("historian1granter", "historian1grantee", 5000, 2),
            bank_line("historian1abc", "uhist", 250, 3),
        );
        pipeline.run_stream(&input).await;

        assert_eq!(pipeline.worker.state(), WorkerState::Closed);
        assert_eq!(pipeline.queue.acked(), 1);
        assert!(pipeline.queue.dead_letters().is_empty());

        let balance = pipeline
            .store
            .latest_at_or_before(namespace::BALANCE, "historian1abc", "uhist", 3)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance.block_height(), 3);

        let allowance = pipeline
            .store
            .latest_at_or_before(
                namespace::ALLOWANCE,
                "historian1granter",
                "historian1grantee",
                9,
            )
            .await
            .unwrap();
        assert!(allowance.is_some());
    }

    #[tokio::test]
    async fn unwatched_store_leaves_the_inbound_queue_empty() {
        let pipeline = Pipeline::new();
        let input = r#"{"operation":"write","key":"validators/v1","value":"x","metadata":{"blockHeight":1,"store_name":"staking"}}"#.to_string() + "\n";
        pipeline.run_stream(&input).await;

        assert_eq!(pipeline.worker.inbound_len(), 0);
        assert_eq!(pipeline.queue.acked(), 0);
        assert!(pipeline.queue.dead_letters().is_empty());
    }

    #[tokio::test]
    async fn transient_handler_failure_retries_and_fans_out_once() {
        // Export side fails twice before the third attempt succeeds;
        // ingest side stays on the real handlers.
        let mut export = HandlerRegistry::new();
        export.register(Arc::new(FlakyBalanceHandler::failing(2)));
        let pipeline = Pipeline::with_registries(HandlerRegistry::with_builtins(), export);

        let input = format!(
            "{}\n{}\n",
            bank_line("historian1abc", "uhist", 100, 1),
            bank_line("historian1xyz", "uhist", 200, 1),
        );
        pipeline.run_stream(&input).await;

        assert_eq!(pipeline.queue.acked(), 1);
        assert!(pipeline.queue.dead_letters().is_empty());
        // search + webhook, one delivery each, both carrying 2 events.
        assert_eq!(*pipeline.fanout.deliveries.lock(), vec![2, 2]);
        assert!(pipeline
            .store
            .latest_at_or_before(namespace::BALANCE, "historian1xyz", "uhist", 1)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn exhausted_retries_dead_letter_without_fanout() {
        let mut export = HandlerRegistry::new();
        export.register(Arc::new(FlakyBalanceHandler::failing(10)));
        let pipeline = Pipeline::with_registries(HandlerRegistry::with_builtins(), export);

        pipeline
            .run_stream(&format!("{}\n", bank_line("historian1abc", "uhist", 100, 1)))
            .await;

        assert_eq!(pipeline.queue.acked(), 0);
        let dead = pipeline.queue.dead_letters();
        assert_eq!(dead.len(), 1);
        assert!(dead[0].1.contains("transient"));
        assert!(pipeline.fanout.deliveries.lock().is_empty());
    }

    #[tokio::test]
    async fn replaying_the_stream_keeps_one_row_per_key() {
        let pipeline = Pipeline::new();
        let input = format!("{}\n", bank_line("historian1abc", "uhist", 100, 1));

        // The worker is restartable after Closed; replay the same stream.
        pipeline.ingest(&input).await;
        pipeline.ingest(&input).await;
        pipeline.drain().await;

        assert_eq!(pipeline.queue.acked(), 2);
        let rows = pipeline
            .store
            .snapshot(namespace::BALANCE, "historian1abc", "", 9)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn racing_writers_leave_one_well_formed_row() {
        let store = Arc::new(InMemoryEventStore::new());
        let event = DependableEvent::Balance(BalanceEvent {
            account: "historian1abc".into(),
            denom: "uhist".into(),
            amount: U256::from(100),
            block_height: 7,
        });

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = Arc::clone(&store);
            let event = event.clone();
            handles.push(tokio::spawn(async move {
                store.upsert(std::slice::from_ref(&event)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let rows = store
            .snapshot(namespace::BALANCE, "historian1abc", "", 9)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], event);
    }
}
