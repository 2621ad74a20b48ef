use anyhow::Result;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

/// Recipient list for the new-request fan-out: ids of active users with
/// the admin or manager role. Keyed by a single constant; the value is
/// the whole list.
static REVIEWER_CACHE: Lazy<Cache<u8, Arc<Vec<u64>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1)
        .time_to_live(Duration::from_secs(60)) // role changes show up within a minute
        .build()
});

const KEY: u8 = 0;

async fn load_from_db(pool: &MySqlPool) -> Result<Vec<u64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (u64,)>(
        r#"
        SELECT id
        FROM users
        WHERE role_id IN (1, 2)
          AND is_active = TRUE
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Cached reviewer ids, refreshed from the store on miss or expiry.
pub async fn reviewer_ids(pool: &MySqlPool) -> Result<Arc<Vec<u64>>, sqlx::Error> {
    if let Some(ids) = REVIEWER_CACHE.get(&KEY).await {
        return Ok(ids);
    }

    let ids = Arc::new(load_from_db(pool).await?);
    REVIEWER_CACHE.insert(KEY, ids.clone()).await;
    Ok(ids)
}

/// Drop the cached list; the next fan-out reloads it. Called whenever
/// registration adds a user.
pub async fn invalidate() {
    REVIEWER_CACHE.invalidate(&KEY).await;
}

/// Populate the cache at startup so the first creation does not pay the
/// store round trip.
pub async fn warmup(pool: &MySqlPool) -> Result<()> {
    let ids = load_from_db(pool).await?;
    let count = ids.len();
    REVIEWER_CACHE.insert(KEY, Arc::new(ids)).await;

    log::info!("Reviewer cache warmup complete: {} reviewers", count);

    Ok(())
}
