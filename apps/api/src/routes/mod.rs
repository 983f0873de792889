pub mod health;


use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::auth::uploads::UPLOAD_BODY_LIMIT;
use crate::state::AppState;
use crate::{applications, auth, companies, interviews, jobs, notifications};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth and profile
        .route("/api/auth/register", post(auth::handlers::handle_register))
        .route("/api/auth/login", post(auth::handlers::handle_login))
        .route("/api/auth/logout", post(auth::handlers::handle_logout))
        .route(
            "/api/auth/profile",
            get(auth::handlers::handle_get_profile).put(auth::handlers::handle_update_profile),
        )
        .route(
            "/api/auth/profile/resume",
            post(auth::handlers::handle_upload_resume)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/auth/profile/picture",
            post(auth::handlers::handle_upload_picture)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/auth/request-otp", post(auth::handlers::handle_request_otp))
        .route("/api/auth/forgot-password", post(auth::handlers::handle_request_otp))
        .route("/api/auth/verify-otp", post(auth::handlers::handle_verify_otp))
        .route(
            "/api/auth/reset-password",
            post(auth::handlers::handle_reset_password),
        )
        // Companies
        .route("/api/company", get(companies::handlers::handle_list))
        .route(
            "/api/company/register",
            post(companies::handlers::handle_register),
        )
        .route("/api/company/check", get(companies::handlers::handle_check))
        .route(
            "/api/company/:id",
            get(companies::handlers::handle_get).put(companies::handlers::handle_update),
        )
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handlers::handle_search).post(jobs::handlers::handle_create),
        )
        .route("/api/jobs/myjobs", get(jobs::handlers::handle_my_jobs))
        .route("/api/jobs/saved", get(jobs::handlers::handle_saved))
        .route(
            "/api/jobs/:id",
            get(jobs::handlers::handle_get)
                .put(jobs::handlers::handle_update)
                .delete(jobs::handlers::handle_delete),
        )
        .route("/api/jobs/:id/save", post(jobs::handlers::handle_save))
        .route("/api/jobs/:id/unsave", delete(jobs::handlers::handle_unsave))
        // Applications
        .route(
            "/api/applications/my-applications",
            get(applications::handlers::handle_my_applications),
        )
        .route(
            "/api/applications/job/:id",
            get(applications::handlers::handle_job_applications),
        )
        .route(
            "/api/applications/:id",
            post(applications::handlers::handle_apply),
        )
        .route(
            "/api/applications/:id/status",
            put(applications::handlers::handle_update_status),
        )
        .route(
            "/api/applications/:id/message",
            post(applications::handlers::handle_message),
        )
        // Interviews
        .route("/api/interviews", post(interviews::handlers::handle_schedule))
        .route(
            "/api/interviews/recruiter",
            get(interviews::handlers::handle_recruiter_interviews),
        )
        .route(
            "/api/interviews/candidate",
            get(interviews::handlers::handle_candidate_interviews),
        )
        .route(
            "/api/interviews/recruiter-applicants",
            get(interviews::handlers::handle_recruiter_applicants),
        )
        .route(
            "/api/interviews/:id",
            get(interviews::handlers::handle_get)
                .put(interviews::handlers::handle_update)
                .delete(interviews::handlers::handle_cancel),
        )
        // Notifications
        .route("/api/notifications", get(notifications::handlers::handle_list))
        .route(
            "/api/notifications/unread-count",
            get(notifications::handlers::handle_unread_count),
        )
        .route(
            "/api/notifications/read-all",
            put(notifications::handlers::handle_mark_all_read),
        )
        .route(
            "/api/notifications/:id/read",
            put(notifications::handlers::handle_mark_read),
        )
        .route(
            "/api/notifications/:id",
            delete(notifications::handlers::handle_delete),
        )
        .with_state(state)
}
