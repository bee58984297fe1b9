use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{FlowError, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// timer bounds for new timer steps when the context has no preset
    pub default_timer: TimerPreset,
    /// timer presets keyed by caller context id
    pub timer_presets: HashMap<String, TimerPreset>,
    /// number of imported flows kept in the engine cache, defaults to 256
    pub cache_capacity: u64,
}

/// Wait bounds in seconds for a freshly created timer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimerPreset {
    pub min: u32,
    pub max: u32,
}

impl Default for TimerPreset {
    fn default() -> Self {
        Self {
            min: 5,
            max: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timer: TimerPreset::default(),
            timer_presets: HashMap::new(),
            cache_capacity: 256,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| FlowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Timer preset for `context`, falling back to the default one.
    pub fn timer_preset(
        &self,
        context: &str,
    ) -> TimerPreset {
        self.timer_presets.get(context).copied().unwrap_or(self.default_timer)
    }

    pub fn validate(&self) -> Result<()> {
        let presets = std::iter::once(("default_timer", &self.default_timer)).chain(self.timer_presets.iter().map(|(k, v)| (k.as_str(), v)));
        for (name, preset) in presets {
            if preset.min > preset.max {
                return Err(FlowError::Config(format!("timer preset {}: min {} is above max {}", name, preset.min, preset.max)));
            }
        }
        if self.cache_capacity == 0 {
            return Err(FlowError::Config("cache_capacity must be positive".to_string()));
        }
        Ok(())
    }
}
