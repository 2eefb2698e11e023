use recap_core::chunk::ChunkerConfig;
use recap_core::http::HttpConfig;
use recap_core::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const CONFIG_VERSION: u32 = 1;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory not found; set HOME")]
    HomeMissing,
    #[error("config io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
}

impl ConfigPaths {
    pub fn from_home() -> Result<Self, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::HomeMissing)?;
        Ok(Self::from_base(PathBuf::from(home).join(".recap")))
    }

    pub fn from_base(base_dir: PathBuf) -> Self {
        let config_path = base_dir.join("config.toml");
        let data_dir = base_dir.join("data");
        Self {
            base_dir,
            config_path,
            data_dir,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub chunking: ChunkingConfig,
    pub extract: ExtractConfig,
    pub http: HttpSettings,
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            chunking: ChunkingConfig::default(),
            extract: ExtractConfig::default(),
            http: HttpSettings::default(),
            store: StoreConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
    pub context_tail: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: recap_core::chunk::DEFAULT_CHUNK_SIZE,
            overlap: recap_core::chunk::DEFAULT_CHUNK_OVERLAP,
            context_tail: recap_core::extract::DEFAULT_CONTEXT_TAIL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub active: String,
    pub local: ProviderConfig,
    pub cloud: ProviderConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            active: "local".to_string(),
            local: ProviderConfig {
                provider: "ollama".to_string(),
                model: "qwen3:30b-a3b".to_string(),
                api_key: String::new(),
            },
            cloud: ProviderConfig {
                provider: "openrouter".to_string(),
                model: "google/gemini-2.5-flash".to_string(),
                api_key: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: usize,
    /// Whole-run budget for `recap process`; 0 disables it.
    pub run_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: recap_core::http::DEFAULT_CALL_TIMEOUT_SECS,
            max_retries: recap_core::http::DEFAULT_MAX_RETRIES,
            run_timeout_secs: recap_core::pipeline::DEFAULT_RUN_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Empty means `<base_dir>/data`.
    pub data_dir: String,
}

impl Config {
    pub fn load_or_create(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        ensure_dirs(paths)?;
        if paths.config_path.exists() {
            let config = Self::load(paths)?;
            return Ok(config);
        }

        let config = Self::default();
        Self::write(paths, &config)?;
        Ok(config)
    }

    pub fn load(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        ensure_dirs(paths)?;
        let content = fs::read_to_string(&paths.config_path)?;
        let raw: toml::Value = toml::from_str(&content)?;
        // Files written before versioning have no `version` key and count as 0.
        let file_version = match raw.get("version").and_then(|value| value.as_integer()) {
            Some(value) => u32::try_from(value).map_err(|_| {
                ConfigError::Validation(format!(
                    "version must be a non-negative integer (got {value})"
                ))
            })?,
            None => 0,
        };

        let mut config: Config = toml::from_str(&content)?;
        let mut migrated = false;

        if file_version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
            migrated = true;
        } else if file_version > CONFIG_VERSION {
            warn!(
                file_version,
                supported = CONFIG_VERSION,
                "config version is newer than supported; proceeding"
            );
        }

        warn_if_loose_permissions(&paths.config_path)?;

        if migrated {
            Self::write(paths, &config)?;
        }

        Ok(config)
    }

    pub fn write(paths: &ConfigPaths, config: &Config) -> Result<(), ConfigError> {
        ensure_dirs(paths)?;
        let content = toml::to_string_pretty(config)?;
        write_atomic(&paths.config_path, content.as_bytes())?;
        Ok(())
    }

    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        redact_provider(&mut redacted.extract.local);
        redact_provider(&mut redacted.extract.cloud);
        redacted
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_active("extract.active", self.extract.active.as_str())?;
        validate_extract_profile(
            "extract.local",
            &self.extract.local,
            self.extract.active == "local",
        )?;
        validate_extract_profile(
            "extract.cloud",
            &self.extract.cloud,
            self.extract.active == "cloud",
        )?;

        if self.chunking.size == 0 {
            return Err(ConfigError::Validation(
                "chunking.size must be greater than 0".into(),
            ));
        }
        if self.chunking.overlap >= self.chunking.size {
            return Err(ConfigError::Validation(
                "chunking.overlap must be smaller than chunking.size".into(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let chunker = ChunkerConfig::new(self.chunking.size, self.chunking.overlap)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        let run_timeout = match self.http.run_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(PipelineConfig {
            chunker,
            context_tail: self.chunking.context_tail,
            run_timeout,
        })
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            call_timeout: Duration::from_secs(self.http.timeout_secs),
            max_retries: self.http.max_retries,
        }
    }

    pub fn data_dir(&self, paths: &ConfigPaths) -> PathBuf {
        match self.store.data_dir.trim() {
            "" => paths.data_dir.clone(),
            dir => PathBuf::from(dir),
        }
    }
}

fn ensure_dirs(paths: &ConfigPaths) -> Result<(), ConfigError> {
    fs::create_dir_all(&paths.base_dir)?;
    Ok(())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("config path missing parent directory"))?;
    let tmp_path = parent.join("config.toml.tmp");
    fs::write(&tmp_path, contents)?;
    set_strict_permissions(&tmp_path)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn set_strict_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perm)?;
    }
    Ok(())
}

fn warn_if_loose_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let metadata = fs::metadata(path)?;
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                "config file is group/world readable; set permissions to 0600"
            );
        }
    }
    Ok(())
}

fn validate_active(field: &str, value: &str) -> Result<(), ConfigError> {
    match value {
        "local" | "cloud" => Ok(()),
        other => Err(ConfigError::Validation(format!(
            "{field} must be local or cloud (got {other})"
        ))),
    }
}

fn validate_extract_profile(
    label: &str,
    profile: &ProviderConfig,
    is_active: bool,
) -> Result<(), ConfigError> {
    match profile.provider.as_str() {
        "ollama" | "openrouter" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "{label}.provider must be ollama or openrouter (got {other})"
            )));
        }
    }

    if profile.model.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{label}.model must not be empty"
        )));
    }
    if is_active && profile.provider == "openrouter" && profile.api_key.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{label}.api_key required when {label}.provider=openrouter"
        )));
    }
    Ok(())
}

fn redact_provider(profile: &mut ProviderConfig) {
    if !profile.api_key.trim().is_empty() {
        profile.api_key = "<redacted>".to_string();
    }
}
