use sea_orm::{
    ConnectionTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    dto::courses::CourseList,
    entity::courses::{Column, Entity as Courses, Model as CourseModel},
    error::{AppError, AppResult},
    models::Course,
    response::{ApiResponse, Meta},
    routes::params::CourseQuery,
    state::AppState,
};

pub async fn list_courses(
    state: &AppState,
    query: CourseQuery,
) -> AppResult<ApiResponse<CourseList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Title))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(Column::Description))).like(pattern)),
        );
    }

    let finder = Courses::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Course::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Courses",
        CourseList { items },
        Some(meta),
    ))
}

pub async fn get_course(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Course>> {
    let course = find_course(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Course found",
        Course::from(course),
        Some(Meta::empty()),
    ))
}

/// Catalog lookup shared by the payment flow.
pub async fn find_course<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<CourseModel> {
    Courses::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Course not found"))
}
