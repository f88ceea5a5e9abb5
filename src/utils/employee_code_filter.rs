use anyhow::{anyhow, Result};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real employee counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMPLOYEE_CODE_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(
        FILTER_CAPACITY,
        FALSE_POSITIVE_RATE,
    ))
});

#[inline]
fn normalize(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Check if an employee code might be taken (false positives possible).
/// A poisoned lock answers "maybe" so callers fall through to the database.
pub fn might_exist(code: &str) -> bool {
    let code = normalize(code);
    match EMPLOYEE_CODE_FILTER.read() {
        Ok(filter) => filter.contains(&code),
        Err(_) => true,
    }
}

/// Insert a single code into the filter
pub fn insert(code: &str) {
    let code = normalize(code);
    if let Ok(mut filter) = EMPLOYEE_CODE_FILTER.write() {
        filter.add(&code);
    }
}

/// Remove a code from the filter
pub fn remove(code: &str) {
    let code = normalize(code);
    if let Ok(mut filter) = EMPLOYEE_CODE_FILTER.write() {
        filter.remove(&code);
    }
}

/// Warm up the filter using streaming + batching
pub async fn warmup_employee_code_filter(pool: &SqlitePool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT employee_code FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&code));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch)?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch)?;
    }

    log::info!("Employee code filter warmup complete: {} employees", total);
    Ok(())
}

/// Insert a batch of normalized codes
fn insert_batch(codes: &[String]) -> Result<()> {
    let mut filter = EMPLOYEE_CODE_FILTER
        .write()
        .map_err(|_| anyhow!("employee code filter poisoned"))?;

    for code in codes {
        filter.add(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_code_is_reported_regardless_of_case() {
        insert("  EMP-FILTER-77 ");
        assert!(might_exist("emp-filter-77"));
    }

    #[test]
    fn unseen_code_is_usually_absent() {
        assert!(!might_exist("never-inserted-code-3f9a"));
    }
}
