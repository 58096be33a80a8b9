use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Enrollment;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub student_id: Uuid,
    pub course_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressRequest {
    pub progress: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct EnrollmentList {
    #[schema(value_type = Vec<Enrollment>)]
    pub items: Vec<Enrollment>,
}
