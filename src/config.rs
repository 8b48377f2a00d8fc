use crate::sources::SourcePaths;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};
use toml_edit::{DocumentMut, table, value};

pub const DEFAULT_CONFIG_PATH: &str = "allocation.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SourcesSection {
    pub stock: Option<PathBuf>,
    pub supply: Option<PathBuf>,
    pub capacity: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("allocations")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    #[default]
    Disabled,
    Ollama,
    Cliproxy,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub backend: LlmBackend,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_ollama")]
    pub ollama: Endpoint,
    #[serde(default = "default_cliproxy")]
    pub cliproxy: Endpoint,
    #[serde(default = "default_remote")]
    pub remote: Endpoint,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            api_key_env: default_api_key_env(),
            ollama: default_ollama(),
            cliproxy: default_cliproxy(),
            remote: default_remote(),
        }
    }
}

fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

fn default_ollama() -> Endpoint {
    Endpoint {
        base_url: "http://localhost:11434/v1".to_string(),
        model: "qwen3:8b".to_string(),
    }
}

fn default_cliproxy() -> Endpoint {
    Endpoint {
        base_url: "http://localhost:8317/v1".to_string(),
        model: "gpt-4o-mini".to_string(),
    }
}

fn default_remote() -> Endpoint {
    Endpoint {
        base_url: "https://api.openai.com/v1".to_string(),
        model: "gpt-4o-mini".to_string(),
    }
}

impl SourcesSection {
    /// Command-line paths win over the configured ones.
    pub fn merged(&self, overrides: &SourcePaths) -> SourcePaths {
        SourcePaths {
            stock: overrides.stock.clone().or_else(|| self.stock.clone()),
            supply: overrides.supply.clone().or_else(|| self.supply.clone()),
            capacity: overrides.capacity.clone().or_else(|| self.capacity.clone()),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Like `load`, but a missing file means defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Record source paths in the `[sources]` table, keeping the rest of the
    /// file (comments, ordering) untouched. Creates the file if needed.
    pub fn update_sources(
        path: impl AsRef<Path>,
        sources: &SourcePaths,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let mut doc = content.parse::<DocumentMut>()?;

        if !doc.contains_key("sources") {
            doc["sources"] = table();
        }
        for (key, p) in [
            ("stock", &sources.stock),
            ("supply", &sources.supply),
            ("capacity", &sources.capacity),
        ] {
            if let Some(p) = p {
                doc["sources"][key] = value(p.to_string_lossy().as_ref());
            }
        }

        fs::write(&path, doc.to_string())?;
        Ok(())
    }
}
