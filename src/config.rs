use crate::analysis::representatives::RepresentativeStrategy;
use crate::changes::MatcherOptions;
use crate::clustering::Linkage;
use crate::hasher::HasherKind;
use crate::metrics::DistanceWeights;
use crate::selection::cache::DEFAULT_INDEX;
use crate::storage::cache::DEFAULT_FLUSH_EVERY;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub clustering: ClusteringConfig,
    pub distance: DistanceConfig,
    pub changes: MatcherOptions,
    pub cache: CacheConfig,
    pub representatives: RepresentativesConfig,
    pub marks: MarksConfig,
    pub split: SplitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub dataset: PathBuf,
    pub cache_db: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/dataset.json"),
            cache_db: PathBuf::from("cache/mc.db"),
            output_dir: PathBuf::from("out"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub threshold: f64,
    pub max_cluster_size: usize,
    pub linkage: Linkage,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_cluster_size: 50,
            linkage: Linkage::Average,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    pub hasher: HasherKind,
    #[serde(flatten)]
    pub weights: DistanceWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub index: String,
    pub flush_every: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepresentativesConfig {
    pub strategy: RepresentativeStrategy,
    pub k: usize,
}

impl Default for RepresentativesConfig {
    fn default() -> Self {
        Self {
            strategy: RepresentativeStrategy::KMostFrequent,
            k: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarksConfig {
    pub agreement: f64,
    pub top_clusters: usize,
}

impl Default for MarksConfig {
    fn default() -> Self {
        Self {
            agreement: crate::analysis::marks::DEFAULT_AGREEMENT,
            top_clusters: crate::analysis::marks::DEFAULT_TOP_CLUSTERS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub seed: u64,
    pub test_size: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: 124345,
            test_size: 200,
        }
    }
}

/// Reads an optional `Config` file (any format the config crate knows),
/// then `MC__SECTION__KEY` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("MC")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Effective configuration rendered as TOML.
pub fn render_configuration(config: &AppConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::builder()
            .add_source(config::File::from_str(
                "[clustering]\nthreshold = 0.5\n\n[distance]\nhasher = \"weak\"\nfloor = 0.1\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();
        assert_eq!(config.clustering.threshold, 0.5);
        assert_eq!(config.clustering.max_cluster_size, 50);
        assert_eq!(config.distance.hasher, HasherKind::Weak);
        assert_eq!(config.distance.weights.floor, 0.1);
        assert_eq!(config.distance.weights.mismatch_weight, 1.0);
        assert_eq!(config.marks.top_clusters, 51);
        assert_eq!(config.changes.min_dice, 0.5);
    }

    #[test]
    fn test_rendered_configuration_parses_back() {
        let rendered = render_configuration(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.cache.index, DEFAULT_INDEX);
        assert_eq!(parsed.split.seed, 124345);
    }
}
