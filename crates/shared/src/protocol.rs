use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RouteError;

/// Successful signup/unregister body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationAck {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

pub fn activities_route() -> &'static str {
    "/activities"
}

pub fn signup_route() -> &'static str {
    "/activities/:activity_name/signup"
}

pub fn activities_url(base: &Url) -> Result<Url, RouteError> {
    with_segments(base, &["activities"])
}

/// `{base}/activities/{activity}/signup?email={email}` with both values percent-encoded.
pub fn signup_url(base: &Url, activity: &str, email: &str) -> Result<Url, RouteError> {
    let mut url = with_segments(base, &["activities", activity, "signup"])?;
    url.query_pairs_mut().clear().append_pair("email", email);
    Ok(url)
}

fn with_segments(base: &Url, segments: &[&str]) -> Result<Url, RouteError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| RouteError::CannotBeABase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
