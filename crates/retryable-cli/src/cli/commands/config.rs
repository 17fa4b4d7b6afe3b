//! `retryable config` – show where the config lives and what it resolves to.

use anyhow::Result;
use retryable_core::config;

pub fn run_config() -> Result<()> {
    let path = config::config_path()?;
    let cfg = config::load_or_init_at(&path)?;
    println!("# {}", path.display());
    print!("{}", config::to_toml(&cfg)?);
    Ok(())
}
