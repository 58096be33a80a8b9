use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Course;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_hours: i32,
    pub total_seats: i32,
    pub instructor_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CourseList {
    #[schema(value_type = Vec<Course>)]
    pub items: Vec<Course>,
}
