use crate::{
    api::{attendance, chat, leave, notification, project, task, timelog, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::resource("/me")
                    .route(web::get().to(user::me))
                    .route(web::put().to(user::update_me)),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_employees))
                            .route(web::post().to(user::create_employee)),
                    )
                    // /employees/{id}/reset-password
                    .service(
                        web::resource("/{id}/reset-password")
                            .route(web::post().to(user::reset_password)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_employee))
                            .route(web::put().to(user::update_employee))
                            .route(web::delete().to(user::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::patch().to(attendance::check_out)),
                    )
                    .service(web::resource("/status").route(web::get().to(attendance::status)))
                    .service(web::resource("/logs").route(web::get().to(attendance::logs))),
            )
            .service(
                web::scope("/leave")
                    .service(web::resource("/request").route(web::post().to(leave::create_leave)))
                    .service(web::resource("/my").route(web::get().to(leave::my_leaves)))
                    .service(
                        web::resource("/subordinate")
                            .route(web::get().to(leave::subordinate_leaves)),
                    )
                    .service(web::resource("/whos-out").route(web::get().to(leave::whos_out)))
                    .service(
                        web::resource("/{id}/approve").route(web::patch().to(leave::process_leave)),
                    ),
            )
            .service(
                web::scope("/projects")
                    .service(
                        web::resource("")
                            .route(web::get().to(project::list_projects))
                            .route(web::post().to(project::create_project)),
                    )
                    .service(
                        web::resource("/invitations")
                            .route(web::get().to(project::my_invitations)),
                    )
                    .service(
                        web::resource("/{id}/invite")
                            .route(web::post().to(project::invite_members)),
                    )
                    .service(
                        web::resource("/{id}/tasks")
                            .route(web::get().to(project::project_tasks))
                            .route(web::post().to(project::create_project_task)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(project::get_project))
                            .route(web::put().to(project::update_project))
                            .route(web::delete().to(project::delete_project)),
                    ),
            )
            .service(
                web::scope("/members")
                    .service(
                        web::resource("/{id}/accept")
                            .route(web::post().to(project::accept_invitation)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::post().to(project::reject_invitation)),
                    ),
            )
            .service(
                web::scope("/tasks")
                    .service(web::resource("").route(web::get().to(task::list_tasks)))
                    .service(web::resource("/my").route(web::get().to(task::my_tasks)))
                    .service(web::resource("/assign").route(web::post().to(task::assign_task)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(task::get_task))
                            .route(web::put().to(task::update_task))
                            .route(web::delete().to(task::delete_task)),
                    ),
            )
            .service(
                web::scope("/timelogs")
                    .service(
                        web::resource("")
                            .route(web::get().to(timelog::list_timelogs))
                            .route(web::post().to(timelog::create_timelog)),
                    )
                    .service(web::resource("/my").route(web::get().to(timelog::my_timelogs)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(timelog::get_timelog))
                            .route(web::put().to(timelog::update_timelog))
                            .route(web::delete().to(timelog::delete_timelog)),
                    ),
            )
            .service(
                web::scope("/chat").service(
                    web::resource("/messages")
                        .route(web::get().to(chat::list_messages))
                        .route(web::post().to(chat::send_message)),
                ),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("").route(web::get().to(notification::list_notifications)),
                    )
                    .service(
                        web::resource("/unread-count")
                            .route(web::get().to(notification::unread_count)),
                    )
                    .service(
                        web::resource("/mark-all-read")
                            .route(web::post().to(notification::mark_all_as_read)),
                    )
                    .service(
                        web::resource("/{id}/mark-read")
                            .route(web::post().to(notification::mark_as_read)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
