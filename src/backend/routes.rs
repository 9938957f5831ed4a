use axum::{
    routing::{delete, get},
    Router,
};
use crate::backend::{handlers, realtime, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::dashboard_handler))
        .route(
            "/dashboard/goal",
            get(handlers::list_goals_handler)
                .post(handlers::create_goal_handler)
                .delete(handlers::delete_goal_by_query_handler),
        )
        .route("/dashboard/goal/:id", delete(handlers::delete_goal_handler))
        .route(
            "/dashboard/record",
            get(handlers::list_records_handler)
                .post(handlers::create_record_handler)
                .delete(handlers::delete_record_by_query_handler),
        )
        .route("/dashboard/record/:id", delete(handlers::delete_record_handler))
        .route(
            "/dashboard/outcome",
            get(handlers::list_outcomes_handler)
                .post(handlers::create_outcome_handler)
                .delete(handlers::delete_outcome_by_query_handler),
        )
        .route("/dashboard/outcome/:id", delete(handlers::delete_outcome_handler))
        .route("/realtime/ws", get(realtime::ws_handler))
        .route("/realtime/events", get(realtime::sse_handler))
}
