// Configuration loading and parsing (minileague.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::upstream::client::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

pub const CONFIG_FILE: &str = "minileague.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub league: LeagueDefaults,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on standings pages followed for very large leagues.
    pub max_standings_pages: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_standings_pages: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub bootstrap_ttl_secs: u64,
    pub league_ttl_secs: u64,
    /// Lifetime of picks, transfers and scores for a gameweek still in play.
    pub live_ttl_secs: u64,
    /// Lifetime of data for a finished gameweek. `None` keeps it for the
    /// life of the process.
    pub finished_ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bootstrap_ttl_secs: 3600,
            league_ttl_secs: 3600,
            live_ttl_secs: 60,
            finished_ttl_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Cap on rows in the ownership view. `None` reports every player.
    pub ownership_top_k: Option<usize>,
    /// How many per-team fetches run at once during a fan-out.
    pub fanout_concurrency: usize,
    pub team_fetch_timeout_secs: u64,
    /// Score an in-progress gameweek from live player points.
    pub live_scoring: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            ownership_top_k: None,
            fanout_concurrency: 8,
            team_fetch_timeout_secs: 15,
            live_scoring: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeagueDefaults {
    pub default_league_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "minileague_core=info,minileague=info,warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/minileague.toml` relative to `base_dir`.
///
/// This does not copy defaults; see [`load_config`] and
/// [`ensure_config_files`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    load_config_file(&base_dir.join("config").join(CONFIG_FILE))
}

/// Load and validate a single config file.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Seed `config/` from `defaults/` under `base_dir`.
///
/// Files already present in `config/` are left untouched and `*.example`
/// templates are skipped. Returns the paths written. A base without
/// `defaults/` is accepted as long as `config/` exists.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        return if config_dir.is_dir() {
            Ok(vec![])
        } else {
            Err(seed_error(format!(
                "{} has neither defaults/ nor config/",
                base_dir.display()
            )))
        };
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| seed_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let mut written = Vec::new();
    for source in shipped_defaults(&defaults_dir)? {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(name);
        if seed_file(&source, &target)? {
            debug!(path = %target.display(), "seeded config from defaults");
            written.push(target);
        }
    }
    Ok(written)
}

/// Regular files in `defaults/` other than `*.example`, in name order.
fn shipped_defaults(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let unreadable = |e: std::io::Error| seed_error(format!("cannot list {}: {e}", dir.display()));

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        let template = path.extension().is_some_and(|ext| ext == "example");
        if path.is_file() && !template {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy `source` to `target` unless `target` already exists. Returns whether
/// anything was written.
fn seed_file(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let created = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target);
    let mut dest = match created {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(seed_error(format!("cannot create {}: {e}", target.display()))),
    };

    let mut src = std::fs::File::open(source)
        .map_err(|e| seed_error(format!("cannot open {}: {e}", source.display())))?;
    std::io::copy(&mut src, &mut dest).map_err(|e| {
        seed_error(format!(
            "cannot copy {} to {}: {e}",
            source.display(),
            target.display()
        ))
    })?;
    Ok(true)
}

fn seed_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Load config for the current process.
///
/// Resolution order: `./config` (seeded from `./defaults`), then the per-user
/// config directory, then built-in defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;

    if cwd.join("config").exists() || cwd.join("defaults").exists() {
        ensure_config_files(&cwd)?;
        return load_config_from(&cwd);
    }

    if let Some(path) = user_config_path().filter(|p| p.exists()) {
        debug!(path = %path.display(), "loading user config");
        return load_config_file(&path);
    }

    debug!("no config file found, using built-in defaults");
    Ok(Config::default())
}

/// `<platform config dir>/minileague/minileague.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "minileague")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.upstream.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "upstream.base_url".into(),
            message: format!("must be an http(s) URL, got {base_url:?}"),
        });
    }

    let positive: &[(&str, u64)] = &[
        ("upstream.timeout_secs", config.upstream.timeout_secs),
        (
            "upstream.max_standings_pages",
            u64::from(config.upstream.max_standings_pages),
        ),
        ("cache.bootstrap_ttl_secs", config.cache.bootstrap_ttl_secs),
        ("cache.league_ttl_secs", config.cache.league_ttl_secs),
        ("cache.live_ttl_secs", config.cache.live_ttl_secs),
        (
            "stats.fanout_concurrency",
            config.stats.fanout_concurrency as u64,
        ),
        (
            "stats.team_fetch_timeout_secs",
            config.stats.team_fetch_timeout_secs,
        ),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.cache.finished_ttl_secs == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "cache.finished_ttl_secs".into(),
            message: "must be > 0 when set (omit it to cache finished gameweeks indefinitely)"
                .into(),
        });
    }

    if config.stats.ownership_top_k == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "stats.ownership_top_k".into(),
            message: "must be > 0 when set".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// The workspace root, which holds the shipped `defaults/` directory.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .canonicalize()
            .expect("workspace root should exist")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("minileague_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    fn write_config(dir: &Path, text: &str) {
        fs::write(dir.join("config").join(CONFIG_FILE), text).unwrap();
    }

    #[test]
    fn shipped_defaults_load_and_match_builtin_defaults() {
        let root = project_root();
        let config = load_config_file(&root.join("defaults").join(CONFIG_FILE))
            .expect("shipped defaults should be valid");

        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.upstream.timeout_secs, 10);
        assert_eq!(config.cache.live_ttl_secs, 60);
        assert_eq!(config.cache.finished_ttl_secs, None);
        assert_eq!(config.stats.fanout_concurrency, 8);
        assert!(config.stats.live_scoring);
        assert_eq!(config.league.default_league_id, None);
    }

    #[test]
    fn empty_file_uses_section_defaults() {
        let tmp = scratch_dir("config_empty");
        write_config(&tmp, "");

        let config = load_config_from(&tmp).expect("empty config is valid");
        assert_eq!(config.cache.bootstrap_ttl_secs, 3600);
        assert_eq!(config.stats.team_fetch_timeout_secs, 15);
        assert!(config.logging.filter.contains("minileague"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn partial_sections_override_only_named_keys() {
        let tmp = scratch_dir("config_partial");
        write_config(
            &tmp,
            r#"
[cache]
live_ttl_secs = 30
finished_ttl_secs = 86400

[stats]
ownership_top_k = 25

[league]
default_league_id = 314159
"#,
        );

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.cache.live_ttl_secs, 30);
        assert_eq!(config.cache.finished_ttl_secs, Some(86400));
        assert_eq!(config.cache.league_ttl_secs, 3600);
        assert_eq!(config.stats.ownership_top_k, Some(25));
        assert_eq!(config.stats.fanout_concurrency, 8);
        assert_eq!(config.league.default_league_id, Some(314159));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_live_ttl() {
        let tmp = scratch_dir("config_zero_live_ttl");
        write_config(&tmp, "[cache]\nlive_ttl_secs = 0\n");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "cache.live_ttl_secs"),
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_finished_ttl() {
        let tmp = scratch_dir("config_zero_finished_ttl");
        write_config(&tmp, "[cache]\nfinished_ttl_secs = 0\n");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "cache.finished_ttl_secs")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let tmp = scratch_dir("config_zero_fanout");
        write_config(&tmp, "[stats]\nfanout_concurrency = 0\n");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "stats.fanout_concurrency")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let tmp = scratch_dir("config_bad_url");
        write_config(&tmp, "[upstream]\nbase_url = \"ftp://example.com\"\n");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "upstream.base_url"),
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch_dir("config_invalid_toml");
        write_config(&tmp, "this is not valid [[[ toml");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = scratch_dir("config_missing");

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_examples() {
        let tmp = std::env::temp_dir().join("minileague_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();

        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            defaults_dir.join(CONFIG_FILE),
        )
        .unwrap();
        fs::write(defaults_dir.join("minileague.toml.example"), "# example\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config").join(CONFIG_FILE).exists());
        assert!(!tmp.join("config/minileague.toml.example").exists());

        load_config_from(&tmp).expect("copied defaults should load");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_keeps_existing_config() {
        let tmp = scratch_dir("config_ensure_skips");
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), "[stats]\nlive_scoring = true\n").unwrap();
        write_config(&tmp, "# custom\n");

        let copied = ensure_config_files(&tmp).unwrap();
        assert!(copied.is_empty());
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn seeding_writes_each_default_once_in_name_order() {
        let tmp = std::env::temp_dir().join("minileague_config_seed_order");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(defaults_dir.join("nested")).unwrap();
        fs::write(defaults_dir.join("zeta.toml"), "z = 1\n").unwrap();
        fs::write(defaults_dir.join("alpha.toml"), "a = 1\n").unwrap();

        let written = ensure_config_files(&tmp).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alpha.toml", "zeta.toml"]);
        assert!(!tmp.join("config").join("nested").exists());

        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(tmp.join("config").join("alpha.toml")).unwrap(),
            "a = 1\n"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("minileague_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"))
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
