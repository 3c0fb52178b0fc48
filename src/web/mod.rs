pub mod account;
pub mod achievements;
pub mod alumni;
pub mod blog;
pub mod forum;
pub mod initiatives;
pub mod login;
pub mod logout;
pub mod projects;
pub mod upload;
pub mod workshops;

use crate::app_config;
use crate::error::Error;
use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use validator::ValidationError;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    conf.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config());

    // Route resolution will stop at the first match.
    login::configure(conf);
    logout::configure(conf);
    account::configure(conf);
    forum::configure(conf);
    achievements::configure(conf);
    initiatives::configure(conf);
    workshops::configure(conf);
    alumni::configure(conf);
    projects::configure(conf);
    blog::configure(conf);
    upload::configure(conf);
}

/// Malformed bodies answer 400 with the usual `{success, message}` body.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(app_config::limits().max_json_payload_kb as usize * 1024)
        .error_handler(|err, _req| {
            log::debug!("rejected JSON body: {}", err);
            Error::Validation(format!("Invalid JSON body: {}", err)).into()
        })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| Error::Validation("Invalid id".to_owned()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::Validation(format!("Invalid query string: {}", err)).into()
    })
}

#[derive(Serialize)]
pub struct SuccessBody<'a> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

/// 201 with the new resource.
pub fn created<T: Serialize>(body: &T) -> HttpResponse {
    HttpResponse::Created().json(body)
}

/// `{"success": true}`, returned by every delete.
pub fn deleted() -> HttpResponse {
    HttpResponse::Ok().json(SuccessBody {
        success: true,
        message: None,
    })
}

pub fn success(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(SuccessBody {
        success: true,
        message: Some(message),
    })
}

/// Custom validator for required text fields.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Optional text stored as NULL when empty.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates. Use with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Timestamp accepted from clients: either a bare `YYYY-MM-DD` date or an
/// ISO-8601 date-time without offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputDate(pub NaiveDateTime);

impl<'de> Deserialize<'de> for InputDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_input_date(&raw)
            .map(InputDate)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date {:?}", raw)))
    }
}

fn parse_input_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let raw = raw.strip_suffix('Z').unwrap_or(raw);
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
