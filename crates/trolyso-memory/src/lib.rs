//! # TroLySo Memory
//! Conversation history behind the [`HistoryStore`] trait.

pub mod sqlite;

use trolyso_core::config::{MemoryConfig, expand_path};
use trolyso_core::error::Result;
use trolyso_core::traits::HistoryStore;

pub use sqlite::SqliteHistory;

/// Open the configured history store. `:memory:` keeps history in RAM only.
pub fn create_history(config: &MemoryConfig) -> Result<Box<dyn HistoryStore>> {
    if config.db_path == ":memory:" {
        return Ok(Box::new(SqliteHistory::in_memory()?));
    }
    Ok(Box::new(SqliteHistory::open(&expand_path(&config.db_path))?))
}
