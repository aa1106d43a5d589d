//! `pfwd session clear <id>` – drop a stored session.

use anyhow::Result;
use pfwd_core::store::Store;

pub async fn run_session_clear(store: &Store, id: &str) -> Result<()> {
    let n = store.clear_session(id).await?;
    println!("Cleared session {id} ({n} value(s))");
    Ok(())
}
