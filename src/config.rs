use crate::content::provider::ProviderKind;
use crate::filesystem::Directory;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::Display;
use tracing::warn;
use url::Url;

pub type ConfigResult<T> = Result<T, config::ConfigError>;

#[derive(Clone, Copy, Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RegexType {
    Email,
    Password,
    Username,
}

#[derive(Deserialize)]
pub struct Regexes {
    #[serde(with = "serde_regex")]
    pub username: Regex,
    #[serde(with = "serde_regex")]
    pub email: Regex,
    #[serde(with = "serde_regex")]
    pub password: Regex,
}

/// One external image service in the fallback chain.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub url: Url,
    /// Name of the environment variable holding the provider's API token, if it needs one.
    pub token_env: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(skip)]
    pub token: Option<String>,
}

impl ProviderConfig {
    pub fn timeout(&self, default_secs: u64) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(default_secs))
    }
}

#[derive(Deserialize)]
pub struct GenerationConfig {
    /// Provider responses smaller than this are treated as failures.
    pub min_response_bytes: usize,
    pub default_timeout_secs: u64,
    pub min_dimension: u32,
    pub max_dimension: u32,
    /// Tried in order. An empty list means every request is answered by a placeholder.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Deserialize)]
pub struct Config {
    pub port: u16,
    pub public_url: Url,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub password_secret: String,
    pub token_secret: String,
    pub token_lifetime_minutes: i64,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    pub regex: Regexes,
    pub generation: GenerationConfig,
}

impl Config {
    /// Reads the configuration file and applies `ARTBUDDY__`-prefixed environment overrides.
    ///
    /// Providers whose token variable is unset are dropped from the chain with a warning.
    pub fn load() -> ConfigResult<Self> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            warn!("Could not read .env file. Details:\n{err}");
        }

        let mut config: Self = config::Config::builder()
            .add_source(config::File::from(get_config_path()).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix("ARTBUDDY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.resolve_provider_tokens();
        Ok(config)
    }

    pub fn path(&self, directory: Directory) -> PathBuf {
        let directory_name: &'static str = directory.into();
        self.data_dir.join(directory_name)
    }

    pub fn gallery_path(&self) -> PathBuf {
        self.data_dir.join("gallery.json")
    }

    pub fn regex(&self, regex_type: RegexType) -> &Regex {
        match regex_type {
            RegexType::Email => &self.regex.email,
            RegexType::Password => &self.regex.password,
            RegexType::Username => &self.regex.username,
        }
    }

    /// Public address of a generated image.
    pub fn image_url(&self, filename: &str) -> String {
        format!("/static/images/{filename}")
    }

    pub fn full_image_url(&self, filename: &str) -> String {
        let base = self.public_url.as_str().trim_end_matches('/');
        format!("{base}{}", self.image_url(filename))
    }

    fn resolve_provider_tokens(&mut self) {
        self.generation.providers.retain_mut(|provider| {
            let Some(variable) = provider.token_env.as_deref() else {
                return true;
            };
            match std::env::var(variable) {
                Ok(token) if !token.trim().is_empty() => {
                    provider.token = Some(token);
                    true
                }
                _ => {
                    warn!("{variable} is not set, skipping {} provider", provider.kind);
                    false
                }
            }
        });
    }
}

fn get_config_path() -> PathBuf {
    // Use config.toml.dist if in development environment, config.toml if in production
    if let Ok(path) = std::env::var("ARTBUDDY_CONFIG") {
        return PathBuf::from(path);
    }
    match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(var) => Path::new(&var).join("config.toml.dist"),
        Err(_) => std::env::current_exe()
            .ok()
            .and_then(|exe_path| exe_path.parent().map(Path::to_owned))
            .unwrap_or_default()
            .join("config.toml"),
    }
}

#[cfg(test)]
pub fn test_config(data_dir: &Path) -> Config {
    Config {
        port: 0,
        public_url: Url::parse("http://localhost:5000").unwrap(),
        data_dir: data_dir.to_owned(),
        database_url: data_dir.join("artbuddy.db").to_string_lossy().into_owned(),
        password_secret: String::from("test_pepper"),
        token_secret: String::from("test_token_secret"),
        token_lifetime_minutes: 30,
        request_timeout_secs: 120,
        cors_origins: vec![String::from("http://localhost:3000")],
        regex: Regexes {
            username: Regex::new("^[a-zA-Z0-9_-]{3,32}$").unwrap(),
            email: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap(),
            password: Regex::new("^.{5,}$").unwrap(),
        },
        generation: GenerationConfig {
            min_response_bytes: 1000,
            default_timeout_secs: 5,
            min_dimension: 64,
            max_dimension: 2048,
            providers: Vec::new(),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dist_config_parses() {
        let config: Config = config::Config::builder()
            .add_source(
                config::File::from(Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml.dist"))
                    .format(config::FileFormat::Toml),
            )
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.generation.providers.len(), 3);
        assert_eq!(config.generation.providers[0].kind, ProviderKind::Pollinations);
        assert_eq!(config.token_lifetime_minutes, 30);
        assert!(config.regex(RegexType::Username).is_match("artist_01"));
        assert!(!config.regex(RegexType::Email).is_match("not-an-email"));
    }

    #[test]
    fn missing_tokens_skip_providers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        let provider = |kind, token_env: Option<&str>| ProviderConfig {
            kind,
            url: Url::parse("http://127.0.0.1:1/").unwrap(),
            token_env: token_env.map(String::from),
            timeout_secs: None,
            token: None,
        };
        config.generation.providers = vec![
            provider(ProviderKind::Pollinations, None),
            provider(ProviderKind::HuggingFace, Some("ARTBUDDY_TEST_SURELY_UNSET_TOKEN")),
        ];
        config.resolve_provider_tokens();
        assert_eq!(config.generation.providers.len(), 1);
        assert_eq!(config.generation.providers[0].kind, ProviderKind::Pollinations);
    }

    #[test]
    fn image_urls() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        assert_eq!(config.image_url("art_1234abcd.png"), "/static/images/art_1234abcd.png");
        assert_eq!(
            config.full_image_url("art_1234abcd.png"),
            "http://localhost:5000/static/images/art_1234abcd.png"
        );
    }
}
