//! Per-invocation context: resolved config, shared directory and user

use anyhow::{Context as _, Result};
use clap::Args;
use fixture_core::config::{resolve_config, Config, ConfigOverrides, OutputFormat};
use fixture_core::home::get_home_dir;
use fixture_core::io::{discover_candidates, select_newest, Candidate, DATA_EXTENSION};
use fixture_core::{ReconcileError, Reconciler, UserId, XlsxStore};
use std::path::PathBuf;

/// Options accepted by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Shared directory holding the inventory files (defaults to current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Act as this user (defaults to FIXTURE_USER, then the OS login name)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Read configuration from this file instead of .fixture.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

pub struct Context {
    pub config: Config,
    pub dir: PathBuf,
}

impl Context {
    /// Resolve configuration for this invocation
    pub fn resolve(global: &GlobalArgs) -> Result<Self> {
        let home_dir = get_home_dir()?;
        let current_dir = std::env::current_dir()?;

        let overrides = ConfigOverrides {
            shared_dir: global.dir.clone(),
            identity: global.user.clone(),
            format: global.json.then_some(OutputFormat::Json),
            config_path: global.config.clone(),
        };
        let config = resolve_config(&overrides, &current_dir, &home_dir)?;
        let dir = config.shared_dir(&current_dir);
        tracing::debug!("Shared directory: {}", dir.display());

        Ok(Self { config, dir })
    }

    pub fn json(&self) -> bool {
        self.config.display.format == OutputFormat::Json
    }

    pub fn user(&self) -> Result<UserId> {
        Ok(self.config.user()?)
    }

    pub fn reconciler(&self) -> Result<Reconciler<XlsxStore>> {
        if !self.dir.is_dir() {
            anyhow::bail!("Shared directory {} does not exist", self.dir.display());
        }
        Ok(Reconciler::new(&self.dir, self.user()?, XlsxStore))
    }

    /// Every data file in the shared directory; empty when there are none
    pub fn candidates(&self) -> Result<Vec<Candidate>> {
        match discover_candidates(&self.dir, DATA_EXTENSION) {
            Ok(candidates) => Ok(candidates),
            Err(ReconcileError::NoCandidatesFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to list {}", self.dir.display())),
        }
    }

    /// Newest accessible data file, read without reconciling
    pub fn newest_file(&self) -> Result<Option<PathBuf>> {
        let candidates = self.candidates()?;
        Ok(select_newest(&candidates).map(|c| c.path.clone()))
    }
}
