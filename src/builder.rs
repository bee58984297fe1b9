use std::sync::Arc;

use crate::{
    Config, Engine, Result,
    store::{MemRowStore, RowStore},
};

#[derive(Default)]
pub struct EngineBuilder {
    config: Option<Config>,
    store: Option<Arc<dyn RowStore>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(
        mut self,
        store: Arc<dyn RowStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<Engine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let store = self.store.unwrap_or_else(|| Arc::new(MemRowStore::new()));

        Ok(Engine::new(config, store))
    }
}
