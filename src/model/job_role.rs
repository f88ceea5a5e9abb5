use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Position an employee holds (developer, analyst...). Unrelated to access roles.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct JobRole {
    pub id: Uuid,
    #[schema(example = "Analyst")]
    pub name: String,
}
