use crate::{
    api::{conflicts, employee, leave_types, overtime, requests},
    auth::middleware::auth_middleware,
    config::Config,
    docs::openapi_json,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use tracing::warn;

fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    match GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
    {
        Some(cfg) => Some(Governor::new(&cfg)),
        None => {
            warn!(requests_per_min, "Invalid rate limit, protected routes are unthrottled");
            None
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.route("/api-doc/openapi.json", web::get().to(openapi_json));

    let protected = web::scope(&config.api_prefix)
        .wrap(from_fn(auth_middleware))
        .service(web::resource("/impact").route(web::post().to(requests::preview_impact)))
        .service(
            web::scope("/requests")
                // /requests
                .service(
                    web::resource("")
                        .route(web::get().to(requests::list_requests))
                        .route(web::post().to(requests::create_request)),
                )
                // /requests/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(requests::get_request))
                        .route(web::put().to(requests::update_request))
                        .route(web::delete().to(requests::delete_request)),
                )
                .service(web::resource("/{id}/status").route(web::put().to(requests::set_status)))
                .service(
                    web::resource("/{id}/approve")
                        .route(web::put().to(requests::approve_request)),
                )
                .service(
                    web::resource("/{id}/reject").route(web::put().to(requests::reject_request)),
                ),
        )
        .service(
            web::resource("/overtime/sources").route(web::get().to(overtime::available_sources)),
        )
        .service(web::resource("/conflicts").route(web::get().to(conflicts::list_conflicts)))
        .service(
            web::scope("/employee")
                // /employee
                .service(
                    web::resource("")
                        .route(web::post().to(employee::create_employee))
                        .route(web::get().to(employee::list_employees)),
                )
                // /employee/{id}
                .service(web::resource("/{id}").route(web::get().to(employee::get_employee)))
                .service(
                    web::resource("/{id}/ledger").route(web::get().to(employee::employee_ledger)),
                ),
        )
        .service(
            web::scope("/leave-types")
                .service(web::resource("").route(web::get().to(leave_types::list_leave_types)))
                .service(
                    web::resource("/{id}")
                        .route(web::put().to(leave_types::save_leave_type))
                        .route(web::delete().to(leave_types::delete_leave_type)),
                ),
        );

    // rate limiting wraps authentication
    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => cfg.service(protected.wrap(limiter)),
        None => cfg.service(protected),
    };
}
