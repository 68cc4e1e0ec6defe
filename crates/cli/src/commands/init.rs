//! `henrybot init`: write a default config file.

use henrybot_config::AppConfig;
use std::path::Path;

pub fn run(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if write_default(config_path, force)? {
        println!("Created {}", config_path.display());
        println!();
        println!("Next steps:");
        println!("  1. Set OPENAI_API_KEY and DISCORD_TOKEN (or edit the file)");
        println!("  2. Fill in discord.channel_id and discord.bot_id");
        println!("  3. Run: henrybot run");
    } else {
        println!("Config already exists at {}", config_path.display());
        println!("Edit it by hand, or re-run with --force to start over.");
    }
    Ok(())
}

/// Returns `false` when the file exists and `force` is off.
fn write_default(config_path: &Path, force: bool) -> std::io::Result<bool> {
    if config_path.exists() && !force {
        return Ok(false);
    }
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(config_path, AppConfig::default_toml())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(write_default(&path, false).unwrap());
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model.name, AppConfig::default().model.name);
    }

    #[test]
    fn existing_config_is_kept_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(!write_default(&path, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        assert!(write_default(&path, true).unwrap());
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
    }
}
