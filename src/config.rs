use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::data::file_store::FileStore;
use crate::data::store::{CellStore, RestStore};

/// Browse battery-cell specifications from a hosted table or a local export.
#[derive(Debug, Parser)]
#[command(name = "cell-database", version)]
pub struct Config {
    /// Local export (.json, .csv, .parquet) to open instead of the hosted table
    pub file: Option<PathBuf>,

    /// Base URL of the hosted table service (PostgREST / Supabase)
    #[arg(long, env = "CELLDB_URL")]
    pub url: Option<String>,

    /// API key sent as `apikey` and bearer token
    #[arg(long, env = "CELLDB_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Table holding the cell specifications
    #[arg(long, env = "CELLDB_TABLE", default_value = "cells")]
    pub table: String,
}

impl Config {
    /// A file argument wins over a URL. `None` starts the viewer empty.
    pub fn store(&self) -> Option<Arc<dyn CellStore>> {
        if let Some(path) = &self.file {
            return Some(Arc::new(FileStore::new(path.clone())));
        }
        self.url
            .as_ref()
            .map(|url| Arc::new(RestStore::new(url.clone(), self.api_key.clone())) as Arc<dyn CellStore>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["cell-database", "--table", "cells"]).unwrap();
        assert_eq!(config.table, "cells");
        assert!(config.file.is_none());
    }

    #[test]
    fn file_wins_over_url() {
        let config = Config::try_parse_from([
            "cell-database",
            "--url",
            "https://example.supabase.co",
            "export.csv",
        ])
        .unwrap();
        let store = config.store().unwrap();
        assert_eq!(store.describe(), "export.csv");
    }

    #[test]
    fn url_selects_rest_store() {
        let config = Config::try_parse_from([
            "cell-database",
            "--url",
            "https://example.supabase.co",
            "--api-key",
            "anon",
            "--table",
            "cells_v2",
        ])
        .unwrap();
        assert_eq!(config.table, "cells_v2");
        assert_eq!(config.api_key.as_deref(), Some("anon"));
        assert_eq!(
            config.store().unwrap().describe(),
            "https://example.supabase.co"
        );
    }
}
