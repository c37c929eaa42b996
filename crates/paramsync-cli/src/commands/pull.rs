use anyhow::Result;
use std::path::Path;

use paramsync_core::envfile::{stage_file_path, write_env_file};
use paramsync_core::error::SyncError;
use paramsync_core::sync::SyncEngine;

use super::RunContext;

pub async fn run(ctx: &RunContext, output: Option<&Path>, force: bool) -> Result<()> {
    let out = match output {
        Some(p) => p.to_path_buf(),
        None => stage_file_path(&ctx.env_dir, ctx.path.stage()),
    };
    if out.exists() && !force {
        return Err(SyncError::OutputExists(out.display().to_string()).into());
    }

    let store = ctx.open_store().await?;
    let engine = SyncEngine::new(store.as_ref(), ctx.path.clone(), ctx.options.clone());

    let vars = engine.pull().await?;
    if vars.is_empty() {
        tracing::warn!(prefix = %ctx.path.prefix(), "No parameters found");
    }

    write_env_file(&out, &vars, force)?;
    println!("Wrote {} variables to {}", vars.len(), out.display());

    Ok(())
}
