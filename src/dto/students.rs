use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Student;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRequest {
    pub name: String,
    pub email: String,
    pub national_id: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct StudentList {
    #[schema(value_type = Vec<Student>)]
    pub items: Vec<Student>,
}
