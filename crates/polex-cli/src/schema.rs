//! `createdb`, `destroydb` and the hidden `makenoodles`.

use anyhow::Result;

use polex_store::{db, sample};

use crate::Session;

pub async fn run_createdb(session: &Session) -> Result<u8> {
    db::migrate(&session.pool).await?;
    println!("OK: schema is up to date");
    Ok(0)
}

pub async fn run_destroydb(session: &Session) -> Result<u8> {
    db::destroy_schema(&session.pool).await?;
    tracing::warn!(actor = %session.actor, "schema destroyed");
    println!("OK: all tables dropped");
    Ok(0)
}

/// Fill the database with sample exceptions.
pub async fn run_makenoodles(session: &Session) -> Result<u8> {
    let ids = sample::make_noodles(&session.pool, session.today, &session.actor).await?;
    println!("OK: created {} sample exceptions", ids.len());
    Ok(0)
}
