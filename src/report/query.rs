use chrono::{NaiveDate, NaiveTime};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{ReportRequest, ReportRow};

#[derive(sqlx::FromRow)]
struct RecordRow {
    employee_id: Uuid,
    employee_name: String,
    date: NaiveDate,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
}

impl From<RecordRow> for ReportRow {
    fn from(r: RecordRow) -> Self {
        ReportRow {
            employee_id: r.employee_id,
            employee_name: r.employee_name,
            date: r.date,
            check_in: r.check_in.map(|t| r.date.and_time(t)),
            check_out: r.check_out.map(|t| r.date.and_time(t)),
        }
    }
}

/// Attendance rows within the request's inclusive date range, ordered by
/// employee name, date and check-in.
pub async fn fetch_rows(
    pool: &SqlitePool,
    request: &ReportRequest,
) -> Result<Vec<ReportRow>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT e.id AS employee_id, e.name AS employee_name, r.date, r.check_in, r.check_out
        FROM attendance_records r
        JOIN employees e ON e.id = r.employee_id
        WHERE r.date >= "#,
    );
    query.push_bind(request.start_date);
    query.push(" AND r.date <= ");
    query.push_bind(request.end_date);

    let selected = request.selected_employees();
    if !selected.is_empty() {
        query.push(" AND r.employee_id IN (");
        let mut ids = query.separated(", ");
        for id in selected {
            ids.push_bind(id);
        }
        ids.push_unseparated(")");
    }

    query.push(" ORDER BY e.name COLLATE NOCASE, r.date, r.check_in");

    let rows = query.build_query_as::<RecordRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(ReportRow::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_employee, insert_record, memory_pool};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn t(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn request(start: u32, end: u32, ids: Vec<Uuid>) -> ReportRequest {
        ReportRequest {
            start_date: day(start),
            end_date: day(end),
            employee_id: None,
            employee_ids: ids,
        }
    }

    #[actix_web::test]
    async fn range_is_inclusive_and_sorted_by_name_then_date() {
        let pool = memory_pool().await;
        let zoe = insert_employee(&pool, "Z1", "Zoe", true).await;
        let adam = insert_employee(&pool, "A1", "Adam", true).await;

        insert_record(&pool, zoe, day(2), t(9, 0), t(17, 0)).await;
        insert_record(&pool, adam, day(3), t(8, 0), None).await;
        insert_record(&pool, adam, day(1), t(8, 30), t(16, 0)).await;
        insert_record(&pool, adam, day(4), t(8, 0), t(12, 0)).await;

        let rows = fetch_rows(&pool, &request(1, 3, vec![])).await.unwrap();

        let order: Vec<(&str, NaiveDate)> = rows
            .iter()
            .map(|r| (r.employee_name.as_str(), r.date))
            .collect();
        assert_eq!(order, vec![("Adam", day(1)), ("Adam", day(3)), ("Zoe", day(2))]);

        assert_eq!(rows[0].check_in, Some(day(1).and_hms_opt(8, 30, 0).unwrap()));
        assert_eq!(rows[1].check_out, None);
    }

    #[actix_web::test]
    async fn filters_by_selected_employees() {
        let pool = memory_pool().await;
        let a = insert_employee(&pool, "A", "Ann", true).await;
        let b = insert_employee(&pool, "B", "Ben", true).await;
        let c = insert_employee(&pool, "C", "Cal", true).await;
        for id in [a, b, c] {
            insert_record(&pool, id, day(5), t(9, 0), t(10, 0)).await;
        }

        let mut req = request(5, 5, vec![c]);
        req.employee_id = Some(a);
        let rows = fetch_rows(&pool, &req).await.unwrap();

        let names: Vec<&str> = rows.iter().map(|r| r.employee_name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Cal"]);
    }

    #[actix_web::test]
    async fn name_order_ignores_case() {
        let pool = memory_pool().await;
        let zoe = insert_employee(&pool, "Z2", "Zoe", true).await;
        let adam = insert_employee(&pool, "A2", "adam", true).await;
        insert_record(&pool, zoe, day(6), t(9, 0), t(17, 0)).await;
        insert_record(&pool, adam, day(6), t(9, 0), t(17, 0)).await;

        let rows = fetch_rows(&pool, &request(6, 6, vec![])).await.unwrap();

        let names: Vec<&str> = rows.iter().map(|r| r.employee_name.as_str()).collect();
        assert_eq!(names, vec!["adam", "Zoe"]);
    }

    #[actix_web::test]
    async fn empty_range_yields_no_rows() {
        let pool = memory_pool().await;
        let a = insert_employee(&pool, "A", "Ann", true).await;
        insert_record(&pool, a, day(10), t(9, 0), None).await;

        let rows = fetch_rows(&pool, &request(11, 20, vec![])).await.unwrap();
        assert!(rows.is_empty());
    }
}
