//! # Dependent-Key Matching Against the Store
//!
//! Wildcard and prefix keys translated into clauses and answered by the
//! event store's indexed existence query.

#[cfg(test)]
mod tests {
    use ch_02_event_store::adapters::InMemoryEventStore;
    use ch_02_event_store::{
        namespace, AllowanceEvent, ContractStateEvent, DependableEvent, DependentKeyMatcher,
        EventStore,
    };
    use shared_types::{DependentKey, U256};

    fn allowance(granter: &str, grantee: &str, height: u64) -> DependableEvent {
        DependableEvent::Allowance(AllowanceEvent {
            granter: granter.into(),
            grantee: grantee.into(),
            amount: U256::from(1000),
            revoked: false,
            block_height: height,
        })
    }

    fn contract_write(contract: &str, state_key: &str, height: u64) -> DependableEvent {
        DependableEvent::ContractState(ContractStateEvent {
            contract: contract.into(),
            state_key: state_key.into(),
            value: Some("x".into()),
            block_height: height,
        })
    }

    #[tokio::test]
    async fn wildcard_identity_matches_any_granter() {
        let store = InMemoryEventStore::new();
        store
            .upsert(&[allowance("granter9", "grantee1", 5)])
            .await
            .unwrap();

        let keys = vec![DependentKey::exact(namespace::ALLOWANCE, &["*", "grantee1"])];
        let clauses = DependentKeyMatcher::clauses_for(namespace::ALLOWANCE, &keys);
        assert!(store
            .exists_matching(namespace::ALLOWANCE, &clauses, 0, 9)
            .await
            .unwrap());

        let other = vec![DependentKey::exact(namespace::ALLOWANCE, &["*", "grantee2"])];
        let clauses = DependentKeyMatcher::clauses_for(namespace::ALLOWANCE, &other);
        assert!(!store
            .exists_matching(namespace::ALLOWANCE, &clauses, 0, 9)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn prefix_key_matches_every_entry_underneath() {
        let store = InMemoryEventStore::new();
        store
            .upsert(&[contract_write("historian1contract", "holders/acct1", 3)])
            .await
            .unwrap();

        let keys = vec![DependentKey::prefix(
            namespace::WASM,
            &["historian1contract", "holders"],
        )];
        let clauses = DependentKeyMatcher::clauses_for(namespace::WASM, &keys);
        assert!(store
            .exists_matching(namespace::WASM, &clauses, 0, 9)
            .await
            .unwrap());

        let elsewhere = vec![DependentKey::prefix(
            namespace::WASM,
            &["historian1contract", "config"],
        )];
        let clauses = DependentKeyMatcher::clauses_for(namespace::WASM, &elsewhere);
        assert!(!store
            .exists_matching(namespace::WASM, &clauses, 0, 9)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn keys_from_other_namespaces_never_match() {
        let store = InMemoryEventStore::new();
        store
            .upsert(&[allowance("granter1", "grantee1", 5)])
            .await
            .unwrap();

        let keys = vec![DependentKey::exact(
            namespace::BALANCE,
            &["granter1", "grantee1"],
        )];
        let clauses = DependentKeyMatcher::clauses_for(namespace::BALANCE, &keys);
        assert!(!store
            .exists_matching(namespace::BALANCE, &clauses, 0, 9)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn range_bounds_are_exclusive_then_inclusive() {
        let store = InMemoryEventStore::new();
        store
            .upsert(&[allowance("granter1", "grantee1", 5)])
            .await
            .unwrap();

        let keys = vec![DependentKey::exact(
            namespace::ALLOWANCE,
            &["granter1", "grantee1"],
        )];
        let clauses = DependentKeyMatcher::clauses_for(namespace::ALLOWANCE, &keys);

        assert!(store
            .exists_matching(namespace::ALLOWANCE, &clauses, 4, 5)
            .await
            .unwrap());
        assert!(!store
            .exists_matching(namespace::ALLOWANCE, &clauses, 5, 9)
            .await
            .unwrap());
    }
}
