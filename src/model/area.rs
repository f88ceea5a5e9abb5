use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Area {
    pub id: Uuid,
    #[schema(example = "Administration")]
    pub name: String,
}
