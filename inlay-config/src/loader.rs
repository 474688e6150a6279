use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow};
use tracing::debug;

use crate::{
    error::ConfigLoadError,
    models::{ConfigSource, InlayConfig},
};

pub const CONFIG_PATH_VAR: &str = "INLAY_CONFIG_PATH";
pub const CONFIG_JSON_VAR: &str = "INLAY_CONFIG_JSON";
pub const CACHE_DIR_VAR: &str = "INLAY_CACHE_DIR";
pub const RENDER_WIDTH_VAR: &str = "INLAY_RENDER_WIDTH";

const CANDIDATES: &[&str] = &[
    "inlay.toml",
    "inlay.json",
    "config/inlay.toml",
    "config/inlay.json",
];

impl InlayConfig {
    /// Load configuration using `.env` and the process environment.
    /// Evaluation order:
    /// 1) `$INLAY_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$INLAY_CONFIG_JSON` (inline JSON),
    /// 3) the first of `inlay.toml`, `inlay.json`, `config/inlay.toml`,
    ///    `config/inlay.json` in the working directory,
    /// 4) defaults.
    ///
    /// `$INLAY_CACHE_DIR` and `$INLAY_RENDER_WIDTH` then override whatever
    /// was loaded.
    pub fn load_from_env() -> Result<(Self, ConfigSource), ConfigLoadError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "[config] loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err.into()),
        }
        Self::load_with(Path::new("."), |name| env::var(name).ok())
    }

    /// [`Self::load_from_env`] against an explicit working directory and
    /// variable lookup.
    pub fn load_with(
        base_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, ConfigSource), ConfigLoadError> {
        let var = |name: &str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };

        let (mut config, source) = if let Some(path) = var(CONFIG_PATH_VAR) {
            let path = PathBuf::from(path);
            let config =
                Self::load_from_file(&path).map_err(ConfigLoadError::Parse)?;
            (config, ConfigSource::EnvPath(path))
        } else if let Some(raw) = var(CONFIG_JSON_VAR) {
            let config = Self::parse_json(&raw)
                .context("failed to parse INLAY_CONFIG_JSON")
                .map_err(ConfigLoadError::Parse)?;
            (config, ConfigSource::EnvInline)
        } else if let Some(path) = Self::find_default_file(base_dir) {
            let config =
                Self::load_from_file(&path).map_err(ConfigLoadError::Parse)?;
            (config, ConfigSource::File(path))
        } else {
            (Self::default(), ConfigSource::Default)
        };

        if let Some(cache_dir) = var(CACHE_DIR_VAR) {
            config.resolver.cache_dir = PathBuf::from(cache_dir);
        }
        if let Some(raw) = var(RENDER_WIDTH_VAR) {
            config.resolver.layout.render_width =
                raw.trim().parse().map_err(|_| {
                    ConfigLoadError::InvalidOverride {
                        var: RENDER_WIDTH_VAR,
                        value: raw.clone(),
                        expected: "a positive pixel width",
                    }
                })?;
        }

        config.resolver.validate()?;
        debug!(source = %source, "[config] configuration loaded");
        Ok((config, source))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read inlay config from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents).with_context(|| {
                format!("invalid inlay config {}", path.display())
            }),
            Some("toml") => toml::from_str(&contents).map_err(|err| {
                anyhow!("invalid inlay config {}: {}", path.display(), err)
            }),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse inlay config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| anyhow!("invalid inlay config json: {err}"))
    }

    fn find_default_file(base_dir: &Path) -> Option<PathBuf> {
        CANDIDATES
            .iter()
            .map(|candidate| base_dir.join(candidate))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let tmp = tempdir().expect("tempdir");
        let (config, source) =
            InlayConfig::load_with(tmp.path(), env_of(&[])).expect("load");
        assert_eq!(source, ConfigSource::Default);
        assert_eq!(config, InlayConfig::default());
    }

    #[test]
    fn default_file_is_discovered_in_priority_order() {
        let tmp = tempdir().expect("tempdir");
        fs::create_dir(tmp.path().join("config")).expect("mkdir");
        fs::write(
            tmp.path().join("config/inlay.toml"),
            "[resolver.layout]\nrender_width = 480\n",
        )
        .expect("write nested");

        let (config, source) =
            InlayConfig::load_with(tmp.path(), env_of(&[])).expect("load");
        assert_eq!(
            source,
            ConfigSource::File(tmp.path().join("config/inlay.toml"))
        );
        assert_eq!(config.resolver.layout.render_width, 480);

        fs::write(
            tmp.path().join("inlay.json"),
            r#"{"resolver": {"layout": {"render_width": 320}}}"#,
        )
        .expect("write top level");
        let (config, source) =
            InlayConfig::load_with(tmp.path(), env_of(&[])).expect("load");
        assert_eq!(source, ConfigSource::File(tmp.path().join("inlay.json")));
        assert_eq!(config.resolver.layout.render_width, 320);
    }

    #[test]
    fn env_path_wins_over_inline_json_and_files() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("custom.toml");
        fs::write(
            &path,
            "log_filter = \"inlay_core=debug\"\n\n[resolver]\ncache_dir = \"/var/cache/inlay\"\n\n[resolver.fetch]\nmax_concurrent = 2\n",
        )
        .expect("write");
        fs::write(tmp.path().join("inlay.toml"), "").expect("write decoy");

        let path_str = path.display().to_string();
        let (config, source) = InlayConfig::load_with(
            tmp.path(),
            env_of(&[
                (CONFIG_PATH_VAR, path_str.as_str()),
                (CONFIG_JSON_VAR, r#"{"log_filter": "trace"}"#),
            ]),
        )
        .expect("load");

        assert_eq!(source, ConfigSource::EnvPath(path));
        assert_eq!(config.log_filter.as_deref(), Some("inlay_core=debug"));
        assert_eq!(config.resolver.cache_dir, PathBuf::from("/var/cache/inlay"));
        assert_eq!(config.resolver.fetch.max_concurrent, 2);
        assert_eq!(config.resolver.fetch.timeout_secs, 30);
    }

    #[test]
    fn inline_json_is_used_when_no_path_is_set() {
        let tmp = tempdir().expect("tempdir");
        let (config, source) = InlayConfig::load_with(
            tmp.path(),
            env_of(&[(
                CONFIG_JSON_VAR,
                r#"{"resolver": {"layout": {"placeholder_aspect": {"width": 4, "height": 1}}}}"#,
            )]),
        )
        .expect("load");
        assert_eq!(source, ConfigSource::EnvInline);
        assert_eq!(config.resolver.layout.placeholder_aspect.width, 4);
    }

    #[test]
    fn overrides_apply_on_top_of_loaded_config() {
        let tmp = tempdir().expect("tempdir");
        let (config, _) = InlayConfig::load_with(
            tmp.path(),
            env_of(&[
                (CACHE_DIR_VAR, "/tmp/inlay-cache"),
                (RENDER_WIDTH_VAR, " 1024 "),
            ]),
        )
        .expect("load");
        assert_eq!(config.resolver.cache_dir, PathBuf::from("/tmp/inlay-cache"));
        assert_eq!(config.resolver.layout.render_width, 1024);
    }

    #[test]
    fn bad_render_width_override_is_rejected() {
        let tmp = tempdir().expect("tempdir");
        let err = InlayConfig::load_with(
            tmp.path(),
            env_of(&[(RENDER_WIDTH_VAR, "wide")]),
        )
        .expect_err("not a number");
        assert!(matches!(err, ConfigLoadError::InvalidOverride { .. }));

        let err = InlayConfig::load_with(
            tmp.path(),
            env_of(&[(RENDER_WIDTH_VAR, "0")]),
        )
        .expect_err("zero width");
        assert!(matches!(err, ConfigLoadError::Invalid(_)));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join("inlay.toml"), "resolver = [").expect("write");
        let err = InlayConfig::load_with(tmp.path(), env_of(&[]))
            .expect_err("bad toml");
        assert!(matches!(err, ConfigLoadError::Parse(_)));
    }

    #[test]
    fn extensionless_contents_fall_back_to_json() {
        let config = InlayConfig::parse_from_str(
            r#"{"resolver": {"event_capacity": 16}}"#,
            "inline",
        )
        .expect("json fallback");
        assert_eq!(config.resolver.event_capacity, 16);
    }
}
