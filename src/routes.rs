use crate::{
    api::{account, admin_departments, admin_users, request},
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
    let otp_limiter = Arc::new(build_limiter(config.rate_otp_per_min));
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
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            )
            // password-reset flow; tighter limit, the OTP is only 4 digits
            .service(
                web::resource("/forgot-password")
                    .wrap(otp_limiter.clone())
                    .route(web::post().to(handlers::forgot_password)),
            )
            .service(
                web::resource("/verify-otp")
                    .wrap(otp_limiter.clone())
                    .route(web::post().to(handlers::verify_otp)),
            )
            .service(
                web::resource("/reset-password")
                    .wrap(otp_limiter.clone())
                    .route(web::post().to(handlers::reset_password)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(account::me)))
            .service(
                web::resource("/account")
                    .route(web::get().to(account::get_account))
                    .route(web::put().to(account::update_account)),
            )
            .service(
                web::scope("/requests")
                    // /requests
                    .service(
                        web::resource("")
                            .route(web::post().to(request::submit_request))
                            .route(web::get().to(request::list_requests)),
                    )
                    // /requests/{id}
                    .service(web::resource("/{id}").route(web::get().to(request::get_request)))
                    // /requests/{id}/status
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(request::update_status)),
                    )
                    // /requests/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::put().to(request::cancel_request)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::scope("/departments")
                            // /admin/departments
                            .service(
                                web::resource("")
                                    .route(web::get().to(admin_departments::list_departments))
                                    .route(web::post().to(admin_departments::create_department)),
                            )
                            // /admin/departments/all (must register before /{id})
                            .service(
                                web::resource("/all")
                                    .route(web::get().to(admin_departments::list_all_departments)),
                            )
                            // /admin/departments/{id}
                            .service(
                                web::resource("/{id}")
                                    .route(web::put().to(admin_departments::update_department))
                                    .route(web::delete().to(admin_departments::delete_department)),
                            )
                            // /admin/departments/{id}/status
                            .service(
                                web::resource("/{id}/status")
                                    .route(web::put().to(admin_departments::set_department_status)),
                            ),
                    )
                    .service(
                        web::scope("/users")
                            // /admin/users
                            .service(
                                web::resource("")
                                    .route(web::get().to(admin_users::list_users))
                                    .route(web::post().to(admin_users::create_user)),
                            )
                            // /admin/users/all (must register before /{id})
                            .service(
                                web::resource("/all")
                                    .route(web::get().to(admin_users::list_all_users)),
                            )
                            // /admin/users/{id}
                            .service(
                                web::resource("/{id}")
                                    .route(web::put().to(admin_users::update_user))
                                    .route(web::delete().to(admin_users::delete_user)),
                            )
                            // /admin/users/{id}/status
                            .service(
                                web::resource("/{id}/status")
                                    .route(web::put().to(admin_users::set_user_status)),
                            ),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
