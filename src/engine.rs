//! Publishing engine - the main entry point for slotflow.
//!
//! The engine ties the pure serialization core to a row store:
//! - Publishing a flow as one complete row
//! - Loading flows back, through a cache of imported flows
//! - Creating new steps with configured defaults

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    Config, Result,
    codec::{StepKind, StepPayload},
    common::MemCache,
    flow::Flow,
    model::FlowModel,
    row::{self, FlowRow, RowKey},
    store::{MemRowStore, RowStore},
    utils,
};

/// The main publishing engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
/// let key = RowKey::new("sales", "welcome");
///
/// let row = engine.publish(&mut flow, &key)?;
/// let flow = engine.load(&key)?.unwrap_or_default();
/// ```
pub struct Engine {
    config: Config,
    /// Row table the flows are published to.
    store: Arc<dyn RowStore>,
    /// Imported flows by row key.
    flows: MemCache<RowKey, Flow>,
}

impl Engine {
    pub fn new(
        config: Config,
        store: Arc<dyn RowStore>,
    ) -> Self {
        let flows = MemCache::new(config.cache_capacity);
        Self {
            config,
            store,
            flows,
        }
    }

    /// Creates an engine over an in-memory row store.
    pub fn new_with_config(config: Config) -> Self {
        Self::new(config, Arc::new(MemRowStore::new()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn RowStore> {
        self.store.clone()
    }

    /// Publish `flow` under `key`, replacing the whole stored row.
    ///
    /// An inconsistent slot assignment is normalized in place first, so the caller's
    /// flow shows the slots that were written.
    pub fn publish(
        &self,
        flow: &mut Flow,
        key: &RowKey,
    ) -> Result<FlowRow> {
        if !flow.is_consistent() {
            flow.renormalize()?;
        }

        let mut row = row::publish(flow, key)?;
        row.updated_at = Some(utils::time_millis());
        let replaced = self.store.upsert(&row)?;
        self.flows.remove(key);

        debug!("published {} ({} slots, replaced: {})", key, row.slots.len(), replaced);
        Ok(row)
    }

    /// Validate editor input and publish it.
    pub fn publish_model(
        &self,
        model: &FlowModel,
        key: &RowKey,
    ) -> Result<FlowRow> {
        let mut flow = Flow::try_from(model)?;
        self.publish(&mut flow, key)
    }

    /// Load the flow stored under `key`.
    pub fn load(
        &self,
        key: &RowKey,
    ) -> Result<Option<Flow>> {
        if let Some(flow) = self.flows.get(key) {
            trace!("engine::load({}) cached", key);
            return Ok(Some(flow));
        }

        let Some(row) = self.store.find(key)? else {
            return Ok(None);
        };
        let flow = row::import(&row);
        self.flows.set(key.clone(), flow.clone());
        Ok(Some(flow))
    }

    /// Keys of every flow published in `group`.
    pub fn list(
        &self,
        group: &str,
    ) -> Result<Vec<RowKey>> {
        Ok(self.store.list(group)?.iter().map(FlowRow::key).collect())
    }

    pub fn delete(
        &self,
        key: &RowKey,
    ) -> Result<bool> {
        self.flows.remove(key);
        self.store.delete(key)
    }

    /// Default content for a new step of `kind`, ready for `Flow::add_step`. Timers take
    /// the preset configured for `context`.
    ///
    /// Kinds that [`StepKind::needs_content`] come back with an empty url, target flow or
    /// tag name, which the editor fills in before adding the step.
    pub fn new_step(
        &self,
        context: &str,
        kind: StepKind,
    ) -> StepPayload {
        StepPayload::default_for(kind, self.config.timer_preset(context))
    }
}
