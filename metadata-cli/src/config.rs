use serde_derive::{Deserialize, Serialize};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Demo-binary configuration, loaded once at startup. Separate from
/// [`metadata::MetaTableConfig`], which governs the table itself; this one
/// only controls how the demo process presents itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub log_level: String,
    pub default_partition_tag: Option<String>,
    pub max_partition_num: Option<i64>,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            default_partition_tag: None,
            max_partition_num: None,
        }
    }
}

impl CliConfig {
    pub fn load(path: &str) -> Self {
        confy::load_path(path).unwrap_or_default()
    }

    pub fn table_config(&self) -> metadata::MetaTableConfig {
        let mut cfg = metadata::MetaTableConfig::default();
        if let Some(tag) = &self.default_partition_tag {
            cfg.default_partition_tag = tag.clone();
        }
        if let Some(max) = self.max_partition_num {
            cfg.max_partition_num = max;
        }
        cfg
    }
}
