use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::debug};

use forumgram_notify::NotifierConfig;

/// Standard config file name, checked project-local then user-global.
const CONFIG_FILENAME: &str = "forumgram.toml";

/// Env var that overrides the configured bot token.
const TOKEN_ENV: &str = "FORUMGRAM_BOT_TOKEN";

/// Load config from `path`, or discover it in standard locations.
///
/// Search order when no path is given:
/// 1. `./forumgram.toml` (project-local)
/// 2. `~/.config/forumgram/forumgram.toml` (user-global)
///
/// Falls back to defaults when no file exists. `FORUMGRAM_BOT_TOKEN` always
/// wins over the file's token.
pub fn load(path: Option<&Path>) -> anyhow::Result<NotifierConfig> {
    let mut config = match path.map(Path::to_path_buf).or_else(find_config_file) {
        Some(p) => {
            debug!(path = %p.display(), "loading config");
            let raw = std::fs::read_to_string(&p)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", p.display()))?;
            toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", p.display()))?
        },
        None => {
            debug!("no config file found, using defaults");
            NotifierConfig::default()
        },
    };

    if let Ok(token) = std::env::var(TOKEN_ENV)
        && !token.is_empty()
    {
        config.token = Secret::new(token);
    }

    Ok(config)
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "forumgram") {
        let global = dirs.config_dir().join(CONFIG_FILENAME);
        if global.exists() {
            return Some(global);
        }
    }

    None
}
