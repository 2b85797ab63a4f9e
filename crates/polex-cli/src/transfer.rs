//! `dumpjson` and `importjson`.

use std::io::Read;

use anyhow::{Context, Result};

use polex_store::transfer;

use crate::Session;

/// Write every exception, deleted ones included, to stdout as JSON.
pub async fn run_dump(session: &Session) -> Result<u8> {
    let documents = transfer::export(&session.pool).await?;
    println!("{}", transfer::to_json(&documents)?);
    tracing::info!(count = documents.len(), "exceptions exported");
    Ok(0)
}

/// Replay a `dumpjson` snapshot from stdin. Nothing is written unless every
/// record imports cleanly.
pub async fn run_import(session: &Session) -> Result<u8> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("could not read the snapshot from stdin")?;
    let documents = transfer::from_json(&text).context("could not parse the snapshot")?;

    let summary = transfer::import(&session.pool, &documents)
        .await
        .context("import rolled back")?;
    println!(
        "OK: imported {} exceptions, {} status changes, {} comments, {} forms ({} already present)",
        summary.exceptions,
        summary.status_changes,
        summary.comments,
        summary.form_files,
        summary.skipped
    );
    Ok(0)
}
