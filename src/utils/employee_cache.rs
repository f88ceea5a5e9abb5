use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::SqlitePool;
use std::time::Duration;
use uuid::Uuid;

/// What the kiosk needs to know about an employee to record a mark.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CachedEmployee {
    pub id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub is_active: bool,
}

/// Employee-code lookup cache shared by the attendance handlers.
/// Entries are invalidated whenever the employee row changes.
#[derive(Clone)]
pub struct EmployeeCache {
    inner: Cache<String, CachedEmployee>,
}

impl Default for EmployeeCache {
    fn default() -> Self {
        Self::new(50_000, Duration::from_secs(3600))
    }
}

impl EmployeeCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, code: &str) -> Option<CachedEmployee> {
        self.inner.get(code).await
    }

    pub async fn insert(&self, employee: CachedEmployee) {
        self.inner
            .insert(employee.employee_code.clone(), employee)
            .await;
    }

    pub async fn invalidate(&self, code: &str) {
        self.inner.invalidate(code).await;
    }

    /// Cache hit first, then the database. Misses are not cached.
    pub async fn lookup(
        &self,
        pool: &SqlitePool,
        code: &str,
    ) -> Result<Option<CachedEmployee>, sqlx::Error> {
        if let Some(hit) = self.get(code).await {
            return Ok(Some(hit));
        }

        let found = sqlx::query_as::<_, CachedEmployee>(
            "SELECT id, employee_code, name, is_active FROM employees WHERE employee_code = ?",
        )
        .bind(code)
        .fetch_optional(pool)
        .await?;

        if let Some(employee) = &found {
            self.insert(employee.clone()).await;
        }

        Ok(found)
    }

    /// Batch mark employees into the cache
    async fn batch_insert(&self, employees: Vec<CachedEmployee>) {
        let futures: Vec<_> = employees.into_iter().map(|e| self.insert(e)).collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }

    /// Load active employees into the cache (batched)
    pub async fn warmup(&self, pool: &SqlitePool, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, CachedEmployee>(
            r#"
            SELECT id, employee_code, name, is_active
            FROM employees
            WHERE is_active = 1
            "#,
        )
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(row?);
            total_count += 1;

            if batch.len() >= batch_size {
                self.batch_insert(std::mem::take(&mut batch)).await;
            }
        }

        if !batch.is_empty() {
            self.batch_insert(batch).await;
        }

        log::info!("Employee cache warmup complete: {} active employees", total_count);

        Ok(())
    }
}
