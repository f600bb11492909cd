//! redb table definitions for the installation store.
//!
//! `&str` keys and `&[u8]` values (JSON-serialized records).

use redb::TableDefinition;

/// Installation records keyed by `{workload_id}`.
pub const INSTALLATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("installations");
