//! # Computation Engine
//!
//! The query surface over historical chain state. Point queries evaluate a
//! formula at one block; range queries step across a block or time interval
//! and evaluate at each sample.
//!
//! ## Reuse Decision
//!
//! For a query at block Q with a cache entry computed at B ≤ Q:
//!
//! - B == Q: the entry is exact, return it.
//! - B < Q: the entry is valid through Q iff no event matching its
//!   recorded dependent keys exists with height in `(B, Q]`. Any such
//!   event forces a full recomputation at Q — no partial merge of the old
//!   value.
//!
//! Fresh evaluations run against a recording environment and the result is
//! appended to the cache with everything it read.

use crate::domain::{Computation, ComputationKey, ComputeError, RangeBounds, RangeSample};
use crate::ports::ComputationCache;
use ch_01_block_time::BlockTimes;
use ch_02_event_store::{DependentKeyMatcher, EventStore};
use ch_03_formulas::{validate_args, FormulaArgs, FormulaEnv, FormulaKind, FormulaRegistry};
use historian_telemetry::{CACHE_HITS, CACHE_MISSES, COMPUTATIONS};
use shared_types::{Block, BlockHeight, DependentKey, TimestampMs, ValidationError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Evaluates formulas over historical chain state with dependency-tracked
/// caching.
pub struct ComputationEngine<C, S, B>
where
    C: ComputationCache,
    S: EventStore,
    B: BlockTimes,
{
    registry: Arc<FormulaRegistry>,
    cache: C,
    events: S,
    block_times: B,
}

impl<C, S, B> ComputationEngine<C, S, B>
where
    C: ComputationCache,
    S: EventStore,
    B: BlockTimes,
{
    /// Creates a new engine over the given ports.
    pub fn new(registry: Arc<FormulaRegistry>, cache: C, events: S, block_times: B) -> Self {
        Self {
            registry,
            cache,
            events,
            block_times,
        }
    }

    /// Evaluate a formula at a block.
    ///
    /// Returns the cached value verbatim when it is still valid at
    /// `block`; otherwise computes fresh and appends a new cache entry.
    #[instrument(skip(self, args), fields(kind = %kind, name = name, address = address, height = block.height))]
    pub async fn compute_at(
        &self,
        kind: FormulaKind,
        name: &str,
        address: &str,
        args: &FormulaArgs,
        block: Block,
    ) -> Result<serde_json::Value, ComputeError> {
        let formula = self
            .registry
            .get(kind, name)
            .ok_or_else(|| ComputeError::UnknownFormula {
                kind,
                name: name.to_string(),
            })?;

        // Argument validation runs before any cache lookup or formula body.
        validate_args(&formula.docs(), args)?;

        let key = ComputationKey::new(kind, name, address, args);
        if let Some(entry) = self.cache.latest_at_or_before(&key, block.height).await? {
            if self
                .cached_entry_valid_through(&entry, block.height)
                .await?
            {
                CACHE_HITS.inc();
                debug!(cached_height = entry.block.height, "cache hit");
                return Ok(entry.value);
            }
        }

        CACHE_MISSES.inc();
        let env = FormulaEnv::new(&self.events, block);
        let value = formula.compute(&env, address, args).await?;
        COMPUTATIONS.with_label_values(&[&kind.to_string()]).inc();

        let computation = Computation {
            formula_kind: kind,
            formula_name: name.to_string(),
            address: address.to_string(),
            args_canonical: key.args_canonical,
            block,
            value: value.clone(),
            dependent_keys: env.recorded_keys(),
        };
        self.cache.insert(computation).await?;

        Ok(value)
    }

    /// Evaluate a formula at the newest block at or before a height.
    pub async fn compute_at_height(
        &self,
        kind: FormulaKind,
        name: &str,
        address: &str,
        args: &FormulaArgs,
        height: BlockHeight,
    ) -> Result<serde_json::Value, ComputeError> {
        let block = self.resolve_height(height)?;
        self.compute_at(kind, name, address, args, block).await
    }

    /// Evaluate a formula at the newest block at or before an instant.
    pub async fn compute_at_time(
        &self,
        kind: FormulaKind,
        name: &str,
        address: &str,
        args: &FormulaArgs,
        time_unix_ms: TimestampMs,
    ) -> Result<serde_json::Value, ComputeError> {
        let block = self.block_times.block_at_or_before(time_unix_ms)?;
        self.compute_at(kind, name, address, args, block).await
    }

    /// Evaluate a formula across an interval, producing one sample per
    /// step, ordered ascending by sample position.
    ///
    /// Consecutive samples may resolve to the same block when the step is
    /// finer than block production; that is expected and not deduplicated.
    pub async fn compute_range(
        &self,
        kind: FormulaKind,
        name: &str,
        address: &str,
        args: &FormulaArgs,
        bounds: RangeBounds,
    ) -> Result<Vec<RangeSample>, ComputeError> {
        let (start, end, step, by_time) = match bounds {
            RangeBounds::Blocks { start, end, step } => (start, end, step, false),
            RangeBounds::Times { start, end, step } => (start, end, step, true),
        };
        if step <= 0 {
            return Err(ValidationError::InvalidStep(step).into());
        }
        if start > end {
            return Err(ValidationError::InvalidRange { start, end }.into());
        }
        let step = step as u64;

        let mut samples = Vec::new();
        let mut at = start;
        loop {
            let block = if by_time {
                self.block_times.block_at_or_before(at)?
            } else {
                self.resolve_height(at)?
            };
            let value = self.compute_at(kind, name, address, args, block).await?;
            samples.push(RangeSample {
                block_height: block.height,
                block_time_unix_ms: block.time_unix_ms,
                value,
            });

            match at.checked_add(step) {
                Some(next) if next <= end => at = next,
                _ => break,
            }
        }
        Ok(samples)
    }

    /// Is a cached entry computed at `entry.block` still valid at
    /// `up_to_height`?
    ///
    /// Exact-height hits are always valid. Otherwise, valid iff no event
    /// matching the entry's recorded dependent keys landed in
    /// `(entry_height, up_to_height]` — one indexed existence query per
    /// touched namespace.
    async fn cached_entry_valid_through(
        &self,
        entry: &Computation,
        up_to_height: BlockHeight,
    ) -> Result<bool, ComputeError> {
        if entry.block.height == up_to_height {
            return Ok(true);
        }
        for namespace in Self::namespaces_of(&entry.dependent_keys) {
            let clauses = DependentKeyMatcher::clauses_for(namespace, &entry.dependent_keys);
            if self
                .events
                .exists_matching(namespace, &clauses, entry.block.height, up_to_height)
                .await?
            {
                debug!(
                    namespace,
                    cached_height = entry.block.height,
                    up_to_height,
                    "cache entry invalidated"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn namespaces_of(keys: &[DependentKey]) -> BTreeSet<&str> {
        keys.iter().map(|k| k.namespace()).collect()
    }

    /// Block-stepped queries clamp to the newest recorded block at or
    /// before the sample height. Cache entries are therefore always keyed
    /// at a real block, so a query ahead of the indexed head never pins a
    /// value at a height that later events could land below.
    fn resolve_height(&self, height: BlockHeight) -> Result<Block, ComputeError> {
        Ok(self.block_times.block_at_or_before_height(height)?)
    }
}
