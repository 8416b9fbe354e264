//! `termagent onboard`: first-time setup.

use std::path::{Path, PathBuf};
use termagent_config::AppConfig;
use termagent_core::Result;

/// What onboarding did to the config file.
#[derive(Debug, PartialEq, Eq)]
pub enum Onboarded {
    Created(PathBuf),
    AlreadyExists(PathBuf),
}

pub fn run() -> Result<()> {
    println!("termagent: first-time setup");
    println!("===========================\n");

    match write_default_config(&AppConfig::config_dir())? {
        Onboarded::Created(path) => {
            println!("✅ Created config.toml at: {}", path.display());
            println!("\n📝 Next steps:");
            println!("   1. Add your api_key to {}", path.display());
            println!("      (or export GEMINI_API_KEY)");
            println!("   2. Run: termagent agent\n");
        }
        Onboarded::AlreadyExists(path) => {
            println!("⚠️  Config already exists at: {}", path.display());
            println!("   Edit it manually or delete and re-run onboard.\n");
        }
    }

    Ok(())
}

/// Write the default config into `dir`, leaving an existing file untouched.
pub fn write_default_config(dir: &Path) -> std::io::Result<Onboarded> {
    let path = dir.join("config.toml");
    if path.exists() {
        return Ok(Onboarded::AlreadyExists(path));
    }

    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;
    Ok(Onboarded::Created(path))
}
