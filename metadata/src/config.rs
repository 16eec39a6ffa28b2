use serde_derive::{Deserialize, Serialize};

pub const DEFAULT_PARTITION_TAG: &str = "_default";
const DEFAULT_MAX_PARTITION_NUM: i64 = 4096;

/// Effective constants read once at [`crate::table::MetaTable`] construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaTableConfig {
    pub default_partition_tag: String,
    pub max_partition_num: i64,
}

impl Default for MetaTableConfig {
    fn default() -> Self {
        MetaTableConfig {
            default_partition_tag: DEFAULT_PARTITION_TAG.to_string(),
            max_partition_num: DEFAULT_MAX_PARTITION_NUM,
        }
    }
}
