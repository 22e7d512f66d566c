// src/web/routes.rs
use crate::{
    models::mess::Complaint,
    state::AppState,
    web::{
        admin_handlers, auth_handlers, club_handlers, health_handlers, interview_handlers, mess_handlers, mw_auth, mw_club,
        mw_ownership, mw_roles, mw_throttle, realtime_handlers, resume_handlers, schedule_handlers, user_handlers,
    },
};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    let auth_attempts = || middleware::from_fn_with_state(app_state.clone(), mw_throttle::throttle_auth);

    // --- Public ---
    let public_routes = Router::new()
        .route("/health", get(health_handlers::health))
        .route(
            "/auth/register",
            post(auth_handlers::register).route_layer(auth_attempts()),
        )
        .route("/auth/login", post(auth_handlers::login).route_layer(auth_attempts()))
        // The socket verifies its own credential during the handshake
        .route("/ws", get(realtime_handlers::websocket_handler));

    // --- Optional auth ---
    let browse_routes = Router::new()
        .route("/clubs", get(club_handlers::list_clubs))
        .route("/clubs/{club_id}", get(club_handlers::get_club))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_throttle::throttle_api))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_auth::optional_auth));

    let admin_only = || middleware::from_fn_with_state(app_state.clone(), mw_roles::require_admin);
    let staff_only = || middleware::from_fn_with_state(app_state.clone(), mw_roles::require_staff);

    // --- Authenticated groups (mw_auth applied on the parent router) ---
    let auth_routes = Router::new()
        .route("/me", get(auth_handlers::me))
        .route("/profile", put(auth_handlers::update_profile))
        .route("/password", put(auth_handlers::change_password))
        .route("/logout", post(auth_handlers::logout))
        .route("/account", delete(auth_handlers::deactivate_account))
        .route("/stats", get(auth_handlers::stats).route_layer(admin_only()));

    let user_routes = Router::new()
        .route("/", get(user_handlers::list_users).route_layer(staff_only()))
        .route("/leaderboard/points", get(user_handlers::leaderboard))
        .route("/department/{department}", get(user_handlers::department_users))
        .route("/classmates/{id}", get(user_handlers::classmates))
        .route(
            "/{id}",
            get(user_handlers::get_user).merge(put(user_handlers::update_user).route_layer(admin_only())),
        )
        .route("/{id}/points", put(user_handlers::set_points).route_layer(admin_only()))
        .route("/{id}/achievement", post(user_handlers::add_achievement).route_layer(admin_only()))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_throttle::throttle_users));

    let club_member_routes = Router::new()
        .route("/{club_id}/members", get(club_handlers::list_members))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_club::require_club_member));

    let club_moderator_routes = Router::new()
        .route("/{club_id}/requests", get(club_handlers::list_requests))
        .route("/{club_id}/requests/{request_id}", post(club_handlers::decide_request))
        .route("/{club_id}/members/{account_id}/status", put(club_handlers::set_member_status))
        .route("/{club_id}/members/{account_id}", delete(club_handlers::remove_member))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_club::require_club_moderator));

    let club_admin_routes = Router::new()
        .route("/{club_id}/moderators", post(club_handlers::add_moderator))
        .route("/{club_id}/moderators/{account_id}", delete(club_handlers::remove_moderator))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_club::require_club_admin));

    let club_routes = Router::new()
        .route("/", post(club_handlers::create_club))
        .route("/{club_id}/join", post(club_handlers::join_club))
        .route("/{club_id}/leave", post(club_handlers::leave_club))
        .merge(club_member_routes)
        .merge(club_moderator_routes)
        .merge(club_admin_routes);

    let schedule_routes = Router::new()
        .route("/", get(schedule_handlers::get_schedule))
        .route("/class", post(schedule_handlers::add_class))
        .route("/event", post(schedule_handlers::add_event))
        .route("/exam", post(schedule_handlers::add_exam))
        .route("/event/{event_id}/complete", put(schedule_handlers::complete_event))
        .route("/upcoming", get(schedule_handlers::upcoming));

    let mess_routes = Router::new()
        .route("/menu", get(mess_handlers::menu))
        .route("/complaint", post(mess_handlers::submit_complaint))
        .route("/complaints", get(mess_handlers::list_complaints))
        .route(
            "/complaints/{id}",
            get(mess_handlers::get_complaint).route_layer(middleware::from_fn_with_state(
                app_state.clone(),
                mw_ownership::require_owner::<Complaint>,
            )),
        )
        .route(
            "/complaints/{id}/resolve",
            put(mess_handlers::resolve_complaint).route_layer(staff_only()),
        );

    let interview_routes = Router::new()
        .route("/questions", get(interview_handlers::list_questions))
        .route("/session", post(interview_handlers::start_session))
        .route("/answer", post(interview_handlers::submit_answer));

    let resume_routes = Router::new().route(
        "/",
        get(resume_handlers::get_resume).put(resume_handlers::update_resume),
    );

    let admin_routes = Router::new()
        .route("/dashboard", get(admin_handlers::dashboard))
        .route("/users", get(admin_handlers::list_users))
        .route("/users/{id}/status", put(admin_handlers::set_user_status))
        .route("/users/{id}/role", put(admin_handlers::set_user_role))
        .route("/clubs", get(admin_handlers::list_clubs))
        .route_layer(admin_only());

    // Throttled everywhere except the users API, which carries its own tighter limit
    let throttled_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/clubs", club_routes)
        .nest("/schedule", schedule_routes)
        .nest("/mess", mess_routes)
        .nest("/interview", interview_routes)
        .nest("/resume", resume_routes)
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_throttle::throttle_api));

    let authenticated_routes = Router::new()
        .merge(throttled_routes)
        .nest("/users", user_routes)
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_auth::require_auth));

    let api = Router::new()
        .merge(public_routes)
        .merge(browse_routes)
        .merge(authenticated_routes);

    Router::new().nest("/api", api).with_state(app_state)
}
