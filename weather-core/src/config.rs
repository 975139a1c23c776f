use std::{
    collections::HashMap,
    env, fmt, fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

/// Environment variable holding the OpenWeatherMap API key.
pub const API_KEY_VAR: &str = "WEATHER_API_KEY";

/// Optional override for the provider base URL (mock servers, proxies).
pub const API_URL_VAR: &str = "WEATHER_API_URL";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Env file looked up in the working directory at startup.
pub const DOTENV_FILE: &str = ".env";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("WEATHER_API_KEY is not set")]
    MissingCredential,
}

/// Resolved settings handed to the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = base_url.as_ref().trim().trim_end_matches('/').to_string();
        self
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    ///
    /// An empty API key is treated the same as a missing one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        let config = Self::new(api_key);
        Ok(match lookup(API_URL_VAR).filter(|url| !url.trim().is_empty()) {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Somewhere `.env` entries can be written to.
pub trait EnvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

impl EnvStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// The real process environment.
#[derive(Debug)]
pub struct ProcessEnv {
    _private: (),
}

impl ProcessEnv {
    /// # Safety
    ///
    /// No other thread may read or write the process environment while the
    /// returned handle is in use.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl EnvStore for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }

    fn set(&mut self, key: &str, value: &str) {
        // SAFETY: single-threaded access is guaranteed by whoever built this handle.
        unsafe { env::set_var(key, value) }
    }
}

/// Parse one `.env` line into a key/value pair.
///
/// Returns `None` for blank lines, `#` comments, lines without `=` and
/// entries the environment cannot hold (empty key, NUL bytes).
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = strip_quotes(value.trim());

    if key.is_empty() || key.contains('\0') || value.contains('\0') {
        return None;
    }

    Some((key, value))
}

/// Strip exactly one pair of matching single or double quotes.
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}

/// Apply `.env` contents to `env`, never replacing a non-empty existing value.
///
/// Returns the number of variables written.
pub fn apply_dotenv(contents: &str, env: &mut impl EnvStore) -> usize {
    let mut applied = 0;

    for (key, value) in contents.lines().filter_map(parse_line) {
        if env.get(key).is_some_and(|existing| !existing.is_empty()) {
            debug!(key, "keeping value already set in environment");
            continue;
        }
        env.set(key, value);
        applied += 1;
    }

    applied
}

/// Read the env file at `path` into `env`. A missing file is not an error.
pub fn load_dotenv_into(path: impl AsRef<Path>, env: &mut impl EnvStore) -> Result<usize, ConfigError> {
    let path = path.as_ref();

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "env file not found, skipping");
            return Ok(0);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let applied = apply_dotenv(&contents, env);
    debug!(path = %path.display(), applied, "loaded env file");

    Ok(applied)
}

/// Read the env file at `path` into the process environment.
///
/// # Safety
///
/// Must be called while the process is single-threaded, before any runtime
/// or worker thread is started.
pub unsafe fn load_dotenv(path: impl AsRef<Path>) -> Result<usize, ConfigError> {
    // SAFETY: forwarded to our caller.
    let mut env = unsafe { ProcessEnv::new() };
    load_dotenv_into(path, &mut env)
}
