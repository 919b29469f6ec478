use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Course;

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CourseList {
    #[schema(value_type = Vec<Course>)]
    pub items: Vec<Course>,
}
