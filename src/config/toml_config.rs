use crate::utils::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub store: StoreConfig,
    pub cache: Option<CacheSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    pub ttl_secs: Option<i64>,
    pub check_interval_secs: Option<i64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| CatalogError::InvalidConfigValue {
            field: "config_file".to_string(),
            value: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[store]
endpoint = "https://store.example.com/api"

[cache]
ttl_secs = 300
check_interval_secs = 15
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.store.endpoint, "https://store.example.com/api");
        let cache = config.cache.unwrap();
        assert_eq!(cache.ttl_secs, Some(300));
        assert_eq!(cache.check_interval_secs, Some(15));
    }

    #[test]
    fn test_cache_section_is_optional() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nendpoint = \"http://localhost:8080\"").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not toml at all [[[").unwrap();

        let result = FileConfig::load(file.path());
        assert!(matches!(
            result,
            Err(CatalogError::InvalidConfigValue { .. })
        ));
    }
}
