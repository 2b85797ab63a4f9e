//! Sample data for trying the tool out on an empty database.

use chrono::{Days, NaiveDate};
use sqlx::SqlitePool;

use polex_core::temporal::last_date;
use polex_core::ExceptionId;
use polex_state::NewException;

use crate::error::StoreError;
use crate::lifecycle;

fn sample(
    username: &str,
    service: &str,
    kind: &str,
    detail: &str,
    start: NaiveDate,
    end: NaiveDate,
    submitted: NaiveDate,
) -> NewException {
    NewException {
        username: username.to_owned(),
        submitted_date: submitted,
        start_date: start,
        end_date: end,
        service: service.to_owned(),
        exception_type: kind.to_owned(),
        detail: detail.to_owned(),
    }
}

/// Submit a handful of exceptions and walk some of them through the
/// lifecycle, relative to `today`.
pub async fn make_noodles(
    pool: &SqlitePool,
    today: NaiveDate,
    actor: &str,
) -> Result<Vec<ExceptionId>, StoreError> {
    let plus = |n| {
        today
            .checked_add_days(Days::new(n))
            .map_or(last_date(), |d| d.min(last_date()))
    };
    let minus = |n| today.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);

    let scratch = lifecycle::submit(
        pool,
        &sample("uccaiki", "legion", "quota", "scratch:1TB", plus(1), plus(365), today),
        actor,
    )
    .await?;

    let home = lifecycle::submit(
        pool,
        &sample("uccaiki", "legion", "quota", "home:500MB", minus(60), plus(3), minus(61)),
        actor,
    )
    .await?;
    lifecycle::approve(pool, home, actor, false).await?;
    lifecycle::implement(pool, home, actor, false).await?;

    let queue = lifecycle::submit(
        pool,
        &sample("ccspapp", "grace", "queue", "crag7day", minus(30), minus(2), minus(31)),
        actor,
    )
    .await?;
    lifecycle::approve(pool, queue, actor, false).await?;
    lifecycle::implement(pool, queue, actor, false).await?;

    let access = lifecycle::submit(
        pool,
        &sample("ccspapp", "myriad", "access", "rsdg group", plus(7), plus(30), today),
        actor,
    )
    .await?;
    lifecycle::approve(pool, access, actor, false).await?;

    let shared = lifecycle::submit(
        pool,
        &sample("ucabxyz", "kathleen", "sharedspace", "project:2TB", plus(10), plus(5), today),
        actor,
    )
    .await?;
    lifecycle::reject(pool, shared, actor, false).await?;

    let ids = vec![scratch, home, queue, access, shared];
    tracing::info!(count = ids.len(), "sample exceptions created");
    Ok(ids)
}
