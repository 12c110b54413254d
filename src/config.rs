//! Process-environment configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub struct Config {
    /// Bot credential (`TG_TOKEN`).
    pub token: String,
    /// Database path (`PLANNER_DB`); platform data directory when unset.
    pub db_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("TG_TOKEN").context("TG_TOKEN is not set")?;
        let db_path = std::env::var("PLANNER_DB").ok().map(PathBuf::from);
        Ok(Self { token, db_path })
    }
}
