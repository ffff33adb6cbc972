use serde::Deserialize;

pub const DEFAULT_MAX_PATH_HOPS: usize = 5;
pub const DEFAULT_MAX_PATH_RESULTS: usize = 10;

/// Tunables of the engine. Everything has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on intermediate assets in a path payment or a discovered path.
    pub max_path_hops: usize,
    /// Number of quotes returned by path discovery.
    pub max_path_results: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_path_hops: DEFAULT_MAX_PATH_HOPS,
            max_path_results: DEFAULT_MAX_PATH_RESULTS,
        }
    }
}
