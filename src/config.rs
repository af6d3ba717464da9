use std::env;

use anyhow::{Context, Error};

pub const MAX_DEPTH_VAR: &str = "CLASS_FIELDS_MAX_DEPTH";
pub const LOG_VAR: &str = "CLASS_FIELDS_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// how many constructions may nest before `new` fails
    pub max_construct_depth: usize,
    /// env_logger filter, e.g. `debug` or `class_fields::vm=debug`; RUST_LOG applies when unset
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_construct_depth: 256,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Config::default();
        if let Ok(depth) = env::var(MAX_DEPTH_VAR) {
            config.max_construct_depth = depth
                .parse()
                .with_context(|| format!("{} is not a number: {}", MAX_DEPTH_VAR, depth))?;
        }
        if let Ok(filter) = env::var(LOG_VAR) {
            config.log_filter = Some(filter);
        }
        Ok(config)
    }
}
