use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Site configuration, usually read from `config.toml`.
///
/// Relative paths are resolved against the directory holding the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub layout: LayoutConfig,
    pub references: ReferencesConfig,
    #[serde(default)]
    pub enrich: EnrichConfig,
    /// Education cards, most recent first.
    #[serde(default)]
    pub education: Vec<EducationConfig>,
    /// Outlet logos shown above the science communication section.
    #[serde(default)]
    pub featured_media: Vec<FeaturedMediaConfig>,
    #[serde(default)]
    pub nemo: Option<NemoConfig>,
    /// Articles listed inside the NEMO Kennislink box.
    #[serde(default)]
    pub nemo_links: Vec<NemoLinkConfig>,
    /// Interviews and other media appearances.
    #[serde(default)]
    pub media: Vec<MediaConfig>,
    #[serde(skip)]
    root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    /// Directory of `*.css` files to concatenate.
    pub folder: PathBuf,
    /// Page layout containing `{{head}}` and `{{main}}`.
    pub skeleton: PathBuf,
    /// Output directory for `index.html` and the stylesheet.
    pub output: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferencesConfig {
    /// Substring identifying the site owner among the authors.
    #[serde(default)]
    pub author: String,
    pub file: PathBuf,
    /// Topic name to description, in file order.
    #[serde(default)]
    pub topics: IndexMap<String, String>,
}

impl ReferencesConfig {
    pub fn new(author: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        ReferencesConfig {
            author: author.into(),
            file: file.into(),
            topics: IndexMap::new(),
        }
    }

    /// The configured author, unless blank.
    pub fn match_author(&self) -> Option<&str> {
        let author = self.author.trim();
        (!author.is_empty()).then_some(author)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EducationConfig {
    pub degree: String,
    pub institution: String,
    pub years: String,
    #[serde(default)]
    pub supervisors: Vec<String>,
    pub thesis: Option<String>,
    pub description: Option<String>,
    /// File name under `logos/`.
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedMediaConfig {
    pub name: String,
    pub logo: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NemoConfig {
    pub logo: String,
    pub title: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NemoLinkConfig {
    /// Original (Dutch) title.
    pub title: String,
    pub title_en: String,
    pub year: i32,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub title: String,
    pub outlet: String,
    pub year: i32,
    /// Appearances without a link are listed as plain text.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Pause between two requests to abstract sources.
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        EnrichConfig {
            delay_ms: 1000,
            timeout_secs: 10,
            user_agent: format!("bibsite/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_toml(&contents, root)
    }

    pub fn from_toml(contents: &str, root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(contents)?;
        config.root = root.into();
        Ok(config)
    }

    /// `path` relative to the config file's directory, or unchanged when absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn bibliography_path(&self) -> PathBuf {
        self.resolve(&self.references.file)
    }
}
