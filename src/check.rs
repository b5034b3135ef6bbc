//! Store integrity check command.
//!
//! `pwatch check` scans for `(product, patch_version)` keys stored more
//! than once. The unique constraint makes this impossible through the
//! normal write path, so any hit points at an out-of-band write or a
//! migration gone wrong. Exits non-zero when conflicts are found so the
//! command can gate a scheduled harvest.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;
use crate::sync::check_integrity;

pub async fn run_check(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let conflicts = check_integrity(&store).await?;
    store.close().await;

    if conflicts.is_empty() {
        println!("Store integrity OK: no duplicate keys.");
        return Ok(());
    }

    eprintln!("Found {} duplicate key(s):", conflicts.len());
    for conflict in &conflicts {
        eprintln!("  {}", conflict);
    }
    std::process::exit(1);
}
