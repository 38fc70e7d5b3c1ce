//! 路由表

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// 创建完整的 API 路由
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        // 教师自评
        .route("/:dept/:faculty_id/claims", post(handlers::save_claims))
        .route("/:dept/:faculty_id/submit", post(handlers::submit))
        .route("/:dept/:faculty_id/D", post(handlers::mark_portfolio))
        // 核查
        .route("/:dept/:faculty_id/verify-section-b", post(handlers::verify_section_b))
        .route("/:dept/:faculty_id/verify-authority", post(handlers::verify_authority))
        // 互动评价
        .route(
            "/:dept/external_interaction_marks/:faculty_id/:evaluator_id",
            post(handlers::record_interaction),
        )
        // 校长
        .route("/:dept/:faculty_id/escalate", post(handlers::escalate))
        .route("/:dept/:faculty_id/director-confirm", post(handlers::director_confirm))
        // 分配关系
        .route("/:dept/assign-externals", post(handlers::assign_externals))
        .route(
            "/:dept/assign-externals/:external_id/:faculty_id",
            delete(handlers::remove_external_faculty),
        )
        .route(
            "/:dept/dean-external-assignment/:external_id/:dean_id",
            post(handlers::assign_dean),
        )
        .route(
            "/:dept/dean-external-assignment/:external_id",
            delete(handlers::detach_dean),
        )
        .route(
            "/:dept/verification-committee/addfaculties",
            post(handlers::assign_committee),
        )
        .route(
            "/:dept/verification-committee/:member_id/:faculty_id",
            delete(handlers::remove_committee_faculty),
        )
        // 只读
        .route("/:dept/:faculty_id/get-status", get(handlers::get_status))
        .route("/total_marks/:dept/:faculty_id", get(handlers::total_marks));

    api_routes
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
