use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Row of the `employees` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub password_hash: Option<String>,
    pub area_id: Option<Uuid>,
    pub job_role_id: Option<Uuid>,
}

/// Employee joined with its area and job role names.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": "5b0c6f7e-2d0e-4a55-9e3b-3c1d8c7f2a10",
        "employee_code": "1025",
        "name": "Jane Doe",
        "email": "jane.doe@company.com",
        "phone": "+52 55 1234 5678",
        "is_active": true,
        "is_admin": false,
        "area_name": "IT",
        "job_role_name": "Developer"
    })
)]
pub struct EmployeeSummary {
    pub id: Uuid,
    #[schema(example = "1025")]
    pub employee_code: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(nullable = true)]
    pub email: Option<String>,
    #[schema(nullable = true)]
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    #[schema(nullable = true)]
    pub area_name: Option<String>,
    #[schema(nullable = true)]
    pub job_role_name: Option<String>,
}
