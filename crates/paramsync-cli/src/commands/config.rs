use anyhow::Result;
use std::path::Path;

use paramsync_core::config::ParamsyncConfig;

pub fn run(config_path: &Path, config: &ParamsyncConfig) -> Result<()> {
    let s = &config.paramsync;

    if config_path.exists() {
        println!("Config: {}", config_path.display());
    } else {
        println!("Config: {} (not found, using defaults)", config_path.display());
    }
    println!();
    println!("  App name:       {}", s.app_name.as_deref().unwrap_or("(from --app-name / APP_NAME)"));
    println!("  Region:         {}", s.region.as_deref().unwrap_or("(AWS default)"));
    println!("  Env dir:        {}", s.env_dir);
    println!("  Chunk limit:    {}", s.chunk_limit);
    println!("  Retry delays:   {:?} ms", s.retry_delays_ms);
    println!("  Parameter type: {}", s.parameter_type);
    println!("  Store:          {}", s.store);
    if let Some(path) = &s.store_path {
        println!("  Store path:     {path}");
    }
    if let Some(endpoint) = &s.endpoint_url {
        println!("  Endpoint:       {endpoint}");
    }

    Ok(())
}
