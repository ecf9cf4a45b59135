//! # Configuration
//!
//! One immutable [`NotifierConfig`] is built at process start and handed to
//! every stage. Nothing below this module reads the environment.
//!
//! Precedence, lowest to highest:
//! 1. built-in defaults (brand list, feeds, per-platform limits),
//! 2. optional config file (`$NOTIFIER_CONFIG_PATH`, `config/notifier.toml`,
//!    `config/notifier.json`),
//! 3. environment variables.
//!
//! The webhook credential comes from the environment only.

pub mod file;

use std::{fmt, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::error::{NotifierError, Result};
use crate::render::OutputFormat;

pub use file::{load_file_default, load_file_from, FileConfig};

pub const ENV_PLATFORM: &str = "NOTIFIER_PLATFORM";
pub const ENV_FORMAT: &str = "NOTIFIER_FORMAT";
pub const ENV_LINE_TOKEN: &str = "LINE_CHANNEL_TOKEN";
pub const ENV_LINE_TO: &str = "LINE_TO";
pub const ENV_DISCORD_WEBHOOK: &str = "DISCORD_WEBHOOK";

const DEFAULT_SENT_FILE: &str = "sent_ids.json";
const DEFAULT_TEXT_HEADER: &str = "🚗 自動車ニュース新着\n\n";
const DEFAULT_PACING_MS: u64 = 1_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_THUMBNAIL_TIMEOUT_SECS: u64 = 6;

/// Target chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Line,
    Discord,
}

impl Platform {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(Platform::Line),
            "discord" => Ok(Platform::Discord),
            other => Err(NotifierError::ConfigInvalid(format!(
                "unknown platform {other:?} (expected line|discord)"
            ))),
        }
    }

    fn credential_var(self) -> &'static str {
        match self {
            Platform::Line => ENV_LINE_TOKEN,
            Platform::Discord => ENV_DISCORD_WEBHOOK,
        }
    }

    pub fn default_format(self) -> OutputFormat {
        match self {
            Platform::Line => OutputFormat::Flex,
            Platform::Discord => OutputFormat::Embed,
        }
    }

    fn default_max_posts(self) -> usize {
        match self {
            Platform::Line => 3,
            Platform::Discord => 8,
        }
    }

    /// Text length limit of a single message on the wire.
    fn default_unit_size(self) -> usize {
        match self {
            Platform::Line => 5_000,
            Platform::Discord => 2_000,
        }
    }

    fn default_objects_per_request(self) -> usize {
        match self {
            Platform::Line => 5,
            Platform::Discord => 10,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Line => f.write_str("LINE"),
            Platform::Discord => f.write_str("Discord"),
        }
    }
}

/// A brand keyword, matched case-insensitively, with an optional embed color.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrandKeyword {
    pub keyword: String,
    #[serde(default)]
    pub color: Option<u32>,
}

impl BrandKeyword {
    pub fn new(keyword: &str, color: Option<u32>) -> Self {
        Self {
            keyword: keyword.to_string(),
            color,
        }
    }
}

/// Special-tag detector settings. See [`crate::filter::is_priority`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriorityRule {
    pub label: String,
    /// Compact tokens searched in the whitespace-free text.
    pub tokens: Vec<String>,
    /// Looser rule: all markers present anywhere.
    pub markers: Vec<String>,
    #[serde(default)]
    pub color: Option<u32>,
}

impl Default for PriorityRule {
    fn default() -> Self {
        Self {
            label: "GR86".to_string(),
            tokens: vec!["gr86".to_string(), "gr-86".to_string()],
            markers: vec!["gr".to_string(), "86".to_string()],
            color: Some(0xE74C3C),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub platform: Platform,
    pub format: OutputFormat,
    /// LINE channel token or Discord webhook URL.
    pub credential: String,
    /// LINE push target; broadcast when absent.
    pub line_to: Option<String>,
    pub feed_urls: Vec<String>,
    pub brands: Vec<BrandKeyword>,
    pub priority: PriorityRule,
    pub max_posts_per_run: usize,
    /// Maximum message length in UTF-16 code units.
    pub max_unit_size: usize,
    pub max_objects_per_request: usize,
    pub pacing: Duration,
    /// Deadline for every feed fetch and every chat API request.
    pub request_timeout: Duration,
    pub thumbnail_timeout: Duration,
    pub commit_on_partial_success: bool,
    pub sent_ids_path: PathBuf,
    pub thumbnails: bool,
    pub default_image: Option<String>,
    pub text_header: String,
}

impl NotifierConfig {
    /// Load from the default config file location plus the process environment.
    pub fn load() -> anyhow::Result<Self> {
        let file = load_file_default()?;
        let cfg = Self::from_parts(file, |k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Merge defaults, an already-parsed file and an environment lookup.
    pub fn from_parts<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| env(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let platform = match var(ENV_PLATFORM) {
            Some(p) => Platform::parse(&p)?,
            None => file.platform.unwrap_or(Platform::Line),
        };

        let format = match var(ENV_FORMAT) {
            Some(f) => OutputFormat::parse(&f)
                .ok_or_else(|| NotifierError::ConfigInvalid(format!("unknown format {f:?}")))?,
            None => file.format.unwrap_or_else(|| platform.default_format()),
        };
        if !format.supported_on(platform) {
            return Err(NotifierError::ConfigInvalid(format!(
                "format {format} cannot be posted to {platform}"
            )));
        }

        let credential = var(platform.credential_var())
            .ok_or(NotifierError::ConfigMissing(platform.credential_var()))?;

        let feed_urls = match var("FEED_URLS") {
            Some(s) => split_list(&s),
            None => file.feed_urls.unwrap_or_else(default_feed_urls),
        };

        let known = file.brands.unwrap_or_else(default_brands);
        let brands = match var("BRAND_KEYWORDS") {
            Some(s) => split_list(&s)
                .into_iter()
                .map(|k| {
                    let color = known.iter().find(|b| b.keyword == k).and_then(|b| b.color);
                    BrandKeyword { keyword: k, color }
                })
                .collect(),
            None => known,
        };

        let max_posts_per_run = parse_num(&var, "MAX_POSTS_PER_RUN")?
            .or(file.max_posts_per_run)
            .unwrap_or_else(|| platform.default_max_posts());
        let max_unit_size = parse_num(&var, "MAX_UNIT_SIZE")?
            .or(file.max_unit_size)
            .unwrap_or_else(|| platform.default_unit_size());
        let max_objects_per_request = parse_num(&var, "MAX_OBJECTS_PER_REQUEST")?
            .or(file.max_objects_per_request)
            .unwrap_or_else(|| platform.default_objects_per_request());
        let pacing_ms = parse_num(&var, "PACING_MS")?
            .or(file.pacing_ms)
            .unwrap_or(DEFAULT_PACING_MS);
        let request_timeout_secs = parse_num(&var, "REQUEST_TIMEOUT_SECS")?
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        for (name, v) in [
            ("max_posts_per_run", max_posts_per_run),
            ("max_unit_size", max_unit_size),
            ("max_objects_per_request", max_objects_per_request),
        ] {
            if v == 0 {
                return Err(NotifierError::ConfigInvalid(format!("{name} must be > 0")));
            }
        }

        let commit_on_partial_success = parse_flag(&var, "COMMIT_ON_PARTIAL_SUCCESS")?
            .or(file.commit_on_partial_success)
            .unwrap_or(false);
        let thumbnails = parse_flag(&var, "THUMBNAILS")?
            .or(file.thumbnails)
            .unwrap_or(true);

        let sent_ids_path = var("SENT_IDS_PATH")
            .map(PathBuf::from)
            .or(file.sent_ids_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SENT_FILE));

        Ok(Self {
            platform,
            format,
            credential,
            line_to: var(ENV_LINE_TO).or(file.line_to),
            feed_urls,
            brands,
            priority: file.priority.unwrap_or_default(),
            max_posts_per_run,
            max_unit_size,
            max_objects_per_request,
            pacing: Duration::from_millis(pacing_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            thumbnail_timeout: Duration::from_secs(DEFAULT_THUMBNAIL_TIMEOUT_SECS),
            commit_on_partial_success,
            sent_ids_path,
            thumbnails,
            default_image: var("DEFAULT_IMAGE_URL").or(file.default_image),
            text_header: file
                .text_header
                .unwrap_or_else(|| DEFAULT_TEXT_HEADER.to_string()),
        })
    }

    /// Color of a brand keyword, if one is configured.
    pub fn brand_color(&self, keyword: &str) -> Option<u32> {
        self.brands
            .iter()
            .find(|b| b.keyword == keyword)
            .and_then(|b| b.color)
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_num<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| NotifierError::ConfigInvalid(format!("{key}={v:?} is not a number"))),
    }
}

fn parse_flag<F>(var: &F, key: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(NotifierError::ConfigInvalid(format!(
                "{key}={v:?} is not a boolean"
            ))),
        },
    }
}

/// Brand keywords in match order. "GR" precedes "GR86" on purpose: first hit wins.
pub fn default_brands() -> Vec<BrandKeyword> {
    vec![
        BrandKeyword::new("トヨタ", Some(0xE60012)),
        BrandKeyword::new("レクサス", Some(0xD4AF37)),
        BrandKeyword::new("GR", Some(0xE74C3C)),
        BrandKeyword::new("GR86", Some(0xE74C3C)),
        BrandKeyword::new("ホンダ", Some(0x1E90FF)),
        BrandKeyword::new("アキュラ", None),
        BrandKeyword::new("日産", Some(0xFF4500)),
        BrandKeyword::new("ニスモ", None),
        BrandKeyword::new("マツダ", Some(0x8B0000)),
        BrandKeyword::new("スバル", Some(0x0033A0)),
        BrandKeyword::new("STI", None),
        BrandKeyword::new("三菱", Some(0x990000)),
        BrandKeyword::new("RALLIART", None),
        BrandKeyword::new("スズキ", Some(0x0066CC)),
        BrandKeyword::new("ダイハツ", Some(0xFF0000)),
        BrandKeyword::new("Car Watch", Some(0x666666)),
        BrandKeyword::new("ベストカー", Some(0x666666)),
    ]
}

pub fn default_feed_urls() -> Vec<String> {
    [
        "https://global.toyota/export/jp/allnews_rss.xml",
        "https://global.toyota/jp/newsroom/toyota/rss.xml",
        "https://global.toyota/jp/newsroom/lexus/rss.xml",
        "https://toyotagazooracing.com/jp/rss.xml",
        "https://www.honda.co.jp/rss/",
        "https://global.nissannews.com/ja-JP/rss",
        "https://newsroom.mazda.com/ja_JP/rss.xml",
        "https://www.subaru.co.jp/news/rss.xml",
        "https://www.mitsubishi-motors.com/jp/newsrelease/rss.xml",
        "https://www.suzuki.co.jp/release/rss.xml",
        "https://www.daihatsu.co.jp/news/rss.xml",
        "https://car.watch.impress.co.jp/docs/common/rss.xml",
        "https://bestcarweb.jp/rss",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn line_defaults_follow_platform() {
        let cfg =
            NotifierConfig::from_parts(FileConfig::default(), env_of(&[(ENV_LINE_TOKEN, "tok")]))
                .unwrap();
        assert_eq!(cfg.platform, Platform::Line);
        assert_eq!(cfg.format, OutputFormat::Flex);
        assert_eq!(cfg.max_posts_per_run, 3);
        assert_eq!(cfg.max_unit_size, 5_000);
        assert_eq!(cfg.max_objects_per_request, 5);
        assert!(!cfg.commit_on_partial_success);
        assert_eq!(cfg.brands[0].keyword, "トヨタ");
    }

    #[test]
    fn missing_credential_is_config_missing() {
        let err = NotifierConfig::from_parts(
            FileConfig::default(),
            env_of(&[(ENV_PLATFORM, "discord"), (ENV_LINE_TOKEN, "tok")]),
        )
        .unwrap_err();
        assert!(matches!(err, NotifierError::ConfigMissing(ENV_DISCORD_WEBHOOK)));
        assert!(err.is_config());
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let err = NotifierConfig::from_parts(
            FileConfig::default(),
            env_of(&[(ENV_LINE_TOKEN, "   ")]),
        )
        .unwrap_err();
        assert!(matches!(err, NotifierError::ConfigMissing(ENV_LINE_TOKEN)));
    }

    #[test]
    fn incompatible_format_is_rejected() {
        let err = NotifierConfig::from_parts(
            FileConfig::default(),
            env_of(&[
                (ENV_PLATFORM, "discord"),
                (ENV_FORMAT, "flex"),
                (ENV_DISCORD_WEBHOOK, "https://discord.test/hook"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, NotifierError::ConfigInvalid(_)));
    }

    #[test]
    fn env_overrides_limits_and_keeps_known_colors() {
        let cfg = NotifierConfig::from_parts(
            FileConfig::default(),
            env_of(&[
                (ENV_PLATFORM, "discord"),
                (ENV_DISCORD_WEBHOOK, "https://discord.test/hook"),
                ("MAX_POSTS_PER_RUN", "50"),
                ("PACING_MS", "250"),
                ("REQUEST_TIMEOUT_SECS", "4"),
                ("BRAND_KEYWORDS", "ホンダ, Toyota ,,"),
                ("COMMIT_ON_PARTIAL_SUCCESS", "yes"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.max_posts_per_run, 50);
        assert_eq!(cfg.pacing, Duration::from_millis(250));
        assert_eq!(cfg.request_timeout, Duration::from_secs(4));
        assert_eq!(
            cfg.brands,
            vec![
                BrandKeyword::new("ホンダ", Some(0x1E90FF)),
                BrandKeyword::new("Toyota", None)
            ]
        );
        assert!(cfg.commit_on_partial_success);
    }

    #[test]
    fn bad_numbers_and_zero_limits_fail() {
        let bad = NotifierConfig::from_parts(
            FileConfig::default(),
            env_of(&[(ENV_LINE_TOKEN, "tok"), ("MAX_UNIT_SIZE", "lots")]),
        );
        assert!(matches!(bad, Err(NotifierError::ConfigInvalid(_))));

        let zero = NotifierConfig::from_parts(
            FileConfig::default(),
            env_of(&[(ENV_LINE_TOKEN, "tok"), ("MAX_OBJECTS_PER_REQUEST", "0")]),
        );
        assert!(matches!(zero, Err(NotifierError::ConfigInvalid(_))));
    }
}
