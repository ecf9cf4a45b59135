// src/config/file.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{BrandKeyword, Platform, PriorityRule};
use crate::render::OutputFormat;

pub const ENV_CONFIG_PATH: &str = "NOTIFIER_CONFIG_PATH";

/// On-disk settings. Every field is optional; unset fields fall back to the
/// built-in defaults and may be overridden by the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub platform: Option<Platform>,
    pub format: Option<OutputFormat>,
    pub line_to: Option<String>,
    pub feed_urls: Option<Vec<String>>,
    pub brands: Option<Vec<BrandKeyword>>,
    pub priority: Option<PriorityRule>,
    pub max_posts_per_run: Option<usize>,
    pub max_unit_size: Option<usize>,
    pub max_objects_per_request: Option<usize>,
    pub pacing_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub commit_on_partial_success: Option<bool>,
    pub sent_ids_path: Option<PathBuf>,
    pub thumbnails: Option<bool>,
    pub default_image: Option<String>,
    pub text_header: Option<String>,
}

/// Load settings from an explicit path. Supports TOML or JSON formats.
pub fn load_file_from(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading notifier config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_file(&content, ext.as_str())
        .with_context(|| format!("parsing notifier config {}", path.display()))
}

/// Load settings using env var + fallbacks:
/// 1) $NOTIFIER_CONFIG_PATH
/// 2) config/notifier.toml
/// 3) config/notifier.json
///
/// No file at all is fine and yields empty settings.
pub fn load_file_default() -> Result<FileConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_file_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/notifier.toml");
    if toml_p.exists() {
        return load_file_from(&toml_p);
    }
    let json_p = PathBuf::from("config/notifier.json");
    if json_p.exists() {
        return load_file_from(&json_p);
    }
    Ok(FileConfig::default())
}

fn parse_file(s: &str, hint_ext: &str) -> Result<FileConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            // Unknown extension: JSON if it looks like an object, else TOML.
            if s.trim_start().starts_with('{') {
                Ok(serde_json::from_str(s)?)
            } else {
                Ok(toml::from_str(s)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn toml_and_json_forms_parse() {
        let toml = r#"
platform = "discord"
format = "embed"
max_posts_per_run = 12
feed_urls = ["https://a.test/rss"]

[[brands]]
keyword = "Toyota"
color = 0xE60012

[[brands]]
keyword = "Honda"
"#;
        let cfg = parse_file(toml, "toml").unwrap();
        assert_eq!(cfg.platform, Some(Platform::Discord));
        assert_eq!(cfg.format, Some(OutputFormat::Embed));
        assert_eq!(cfg.max_posts_per_run, Some(12));
        let brands = cfg.brands.unwrap();
        assert_eq!(brands[0], BrandKeyword::new("Toyota", Some(0xE60012)));
        assert_eq!(brands[1], BrandKeyword::new("Honda", None));

        let json = r#"{"format": "text", "pacing_ms": 0, "commit_on_partial_success": true}"#;
        let cfg = parse_file(json, "").unwrap();
        assert_eq!(cfg.format, Some(OutputFormat::PlainText));
        assert_eq!(cfg.pacing_ms, Some(0));
        assert_eq!(cfg.commit_on_partial_success, Some(true));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_file(r#"max_post = 3"#, "toml").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so a real config/ in the repo is not picked up
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_CONFIG_PATH);

        let v = load_file_default().unwrap();
        assert!(v.platform.is_none());

        let cfg_dir = tmp.path().join("config");
        fs::create_dir_all(&cfg_dir).unwrap();
        fs::write(cfg_dir.join("notifier.toml"), r#"max_unit_size = 900"#).unwrap();
        assert_eq!(load_file_default().unwrap().max_unit_size, Some(900));

        // Env var wins over the fallback
        let p_env = tmp.path().join("other.json");
        fs::write(&p_env, r#"{"max_unit_size": 40}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
        assert_eq!(load_file_default().unwrap().max_unit_size, Some(40));

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(load_file_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
