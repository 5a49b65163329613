//! Client configuration for the Perch bindings, loaded from YAML + environment.
//!
//! [`ClientConfig`] is the single immutable value handed to `perch_api::Api` at
//! construction: hosts, API roots, scheme, retry budget, timeouts, response cache
//! lifetime and optional bearer credentials. Nothing here is process-global.
//!
//! Sources are merged in order: YAML files / inline YAML snippets, then
//! `PERCH__`-prefixed environment variables (`PERCH__RETRY_COUNT=3`), and finally
//! `${VAR}` references inside string values are expanded.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Everything the request binder needs to reach the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    /// Host used by bindings flagged as search endpoints.
    pub search_host: String,
    pub api_root: String,
    pub search_root: String,
    /// `https` when set, plain `http` otherwise.
    pub secure: bool,
    /// Additional attempts after the first one.
    pub retry_count: usize,
    pub retry_delay_ms: u64,
    /// Status codes eligible for a retry.
    pub retry_errors: Vec<u16>,
    pub timeout_secs: u64,
    /// Lifetime of cached GET responses; caching is off when unset.
    pub cache_timeout_secs: Option<u64>,
    pub auth: Option<AuthSettings>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "api.twitter.com".into(),
            search_host: "search.twitter.com".into(),
            api_root: "/1".into(),
            search_root: String::new(),
            secure: false,
            retry_count: 0,
            retry_delay_ms: 0,
            retry_errors: Vec::new(),
            timeout_secs: 15,
            cache_timeout_secs: None,
            auth: None,
        }
    }
}

impl ClientConfig {
    pub fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    /// `scheme://host/root` for the regular or the search API.
    ///
    /// ```
    /// use perch_config::ClientConfig;
    ///
    /// let cfg = ClientConfig::default();
    /// assert_eq!(cfg.base_url(false), "http://api.twitter.com/1");
    /// assert_eq!(cfg.base_url(true), "http://search.twitter.com");
    /// ```
    pub fn base_url(&self, search: bool) -> String {
        let (host, root) = if search {
            (&self.search_host, &self.search_root)
        } else {
            (&self.host, &self.api_root)
        };
        format!("{}://{}{}", self.scheme(), host, root.trim_end_matches('/'))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_timeout(&self) -> Option<Duration> {
        self.cache_timeout_secs.map(Duration::from_secs)
    }
}

/// Bearer credentials; `username` feeds bindings that address the caller's own
/// resources (e.g. `/{owner}/lists.json`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct PerchConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PerchConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PerchConfigLoader {
    /// Start with `PERCH__` env overrides only; every field has a default.
    ///
    /// ```
    /// use perch_config::PerchConfigLoader;
    ///
    /// let cfg = PerchConfigLoader::new()
    ///     .with_yaml_str("host: api.example.com\nsecure: true")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.base_url(false), "https://api.example.com/1");
    /// assert_eq!(cfg.retry_count, 0);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, apply `PERCH__` overrides, expand `${VAR}` and
    /// deserialize.
    ///
    /// ```
    /// use perch_config::PerchConfigLoader;
    ///
    /// unsafe { std::env::set_var("PERCH_DOC_TOKEN", "from-env"); }
    ///
    /// let cfg = PerchConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// retry_count: 2
    /// retry_errors: [500, 503]
    /// auth:
    ///   token: "${PERCH_DOC_TOKEN}"
    ///   username: "alice"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(cfg.retry_errors, vec![500, 503]);
    /// let auth = cfg.auth.expect("auth section");
    /// assert_eq!(auth.token, "from-env");
    /// assert_eq!(auth.username.as_deref(), Some("alice"));
    ///
    /// unsafe { std::env::remove_var("PERCH_DOC_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<ClientConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("PERCH")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("retry_errors"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
