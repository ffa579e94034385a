//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers depend only on the driving ports held in [`state::HttpState`];
//! [`configure`] registers every route on an Actix service config.

pub mod accounts;
pub mod admin;
pub mod admin_lots;
pub mod error;
pub mod health;
pub mod identity;
pub mod parking_dto;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod user_parking;
pub mod user_reports;
pub mod validation;

use actix_web::{HttpRequest, error::JsonPayloadError, web};

use crate::domain::Error;

pub use error::ApiResult;

fn json_error(error: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("malformed JSON body: {error}")).into()
}

/// Register every API route, plus JSON body error mapping.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use parking_backend::inbound::http::configure;
///
/// let app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(accounts::register)
        .service(accounts::login)
        .service(admin_lots::create_lot)
        .service(admin_lots::update_lot)
        .service(admin_lots::delete_lot)
        .service(admin_lots::add_spot)
        .service(admin_lots::spot_detail)
        .service(admin_lots::renumber_spot)
        .service(admin_lots::remove_spot)
        .service(admin::dashboard)
        .service(admin::list_users)
        .service(admin::update_profile)
        .service(user_parking::list_lots)
        .service(user_parking::assign)
        .service(user_parking::confirm)
        .service(user_parking::release)
        .service(user_reports::dashboard)
        .service(user_reports::summary);
}
