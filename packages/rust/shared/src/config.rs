//! Application configuration for the docset builder.
//!
//! User config lives at `~/.cdk-docset/cdk-docset.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocsetError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "cdk-docset.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cdk-docset";

// ---------------------------------------------------------------------------
// Config structs (matching cdk-docset.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream site layout.
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP retrieval settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Docset bundle metadata.
    #[serde(default)]
    pub docset: DocsetConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin every site path is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Table-of-contents page listing every reference page.
    #[serde(default = "default_toc_path")]
    pub toc_path: String,

    /// Link target of the header element carrying the version marker.
    #[serde(default = "default_versions_path")]
    pub versions_path: String,

    /// Path prefixes that are mirrored into the docset and linked relatively.
    #[serde(default = "default_local_prefixes")]
    pub local_prefixes: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            toc_path: default_toc_path(),
            versions_path: default_versions_path(),
            local_prefixes: default_local_prefixes(),
        }
    }
}

fn default_base_url() -> String {
    "https://docs.aws.amazon.com".into()
}
fn default_toc_path() -> String {
    "/cdk/api/v2/docs/aws-construct-library.html".into()
}
fn default_versions_path() -> String {
    "/cdk/api/v2/versions.html".into()
}
fn default_local_prefixes() -> Vec<String> {
    vec![
        "/cdk/api/v2/docs/".into(),
        "/cdk/api/v2/img/".into(),
        "/cdk/api/v2/css/".into(),
    ]
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum concurrent requests (and page workers during a build).
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_concurrency() -> u32 {
    16
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[docset]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsetConfig {
    /// Bundle name; the docset directory is `<name>.docset`.
    #[serde(default = "default_docset_name")]
    pub name: String,

    /// `CFBundleIdentifier` in Info.plist.
    #[serde(default = "default_bundle_id")]
    pub bundle_id: String,

    /// `DocSetPlatformFamily` in Info.plist (search keyword prefix).
    #[serde(default = "default_platform_family")]
    pub platform_family: String,

    /// PNG placed at `<name>.docset/icon.png` when packaging. Defaults to the
    /// site favicon mirrored into the docset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,
}

impl Default for DocsetConfig {
    fn default() -> Self {
        Self {
            name: default_docset_name(),
            bundle_id: default_bundle_id(),
            platform_family: default_platform_family(),
            icon: None,
        }
    }
}

fn default_docset_name() -> String {
    "AWS-CDK".into()
}
fn default_bundle_id() -> String {
    "aws-cdk".into()
}
fn default_platform_family() -> String {
    "cdk".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.cdk-docset/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DocsetError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.cdk-docset/cdk-docset.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocsetError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| DocsetError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocsetError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocsetError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocsetError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

impl AppConfig {
    /// Reject values the pipelines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.site.base_url.starts_with("http://") && !self.site.base_url.starts_with("https://")
        {
            return Err(DocsetError::config(format!(
                "site.base_url must be an http(s) URL, got '{}'",
                self.site.base_url
            )));
        }
        if !self.site.toc_path.starts_with('/') {
            return Err(DocsetError::config("site.toc_path must start with '/'"));
        }
        if self.fetch.concurrency == 0 {
            return Err(DocsetError::config("fetch.concurrency must be at least 1"));
        }
        if self.docset.name.trim().is_empty() {
            return Err(DocsetError::config("docset.name must not be empty"));
        }
        Ok(())
    }
}
