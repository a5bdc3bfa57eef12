//! Authentication: establishing who the current user is.
//!
//! Login itself happens in front of this service. The authenticating proxy
//! names the auth source it used in `X-Auth-Source` and forwards the user's
//! attributes as `X-Auth-Attr-<name>` headers, one header per value.

use axum::http::HeaderMap;
use std::collections::HashMap;
use thiserror::Error;

/// Header naming the auth source that authenticated the request.
pub const AUTH_SOURCE_HEADER: &str = "x-auth-source";

/// Prefix of attribute headers.
pub const ATTRIBUTE_HEADER_PREFIX: &str = "x-auth-attr-";

/// Attribute name to its values, as released by the auth source.
pub type Attributes = HashMap<String, Vec<String>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("not authenticated with auth source `{0}`")]
    NotAuthenticated(String),
    #[error("user id is missing")]
    MissingUserId,
}

pub trait Authenticator: Send + Sync {
    /// Require an authenticated request and return its attributes.
    fn authenticate(&self, headers: &HeaderMap) -> Result<Attributes, AuthenticationError>;
}

/// Trusts attribute headers set by the fronting auth proxy.
#[derive(Debug, Clone)]
pub struct HeaderAuthenticator {
    source: String,
}

impl HeaderAuthenticator {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Authenticator for HeaderAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Attributes, AuthenticationError> {
        let source = headers
            .get(AUTH_SOURCE_HEADER)
            .and_then(|value| value.to_str().ok());
        if source != Some(self.source.as_str()) {
            return Err(AuthenticationError::NotAuthenticated(self.source.clone()));
        }

        let mut attributes = Attributes::new();
        for (name, value) in headers {
            let Some(attribute) = name.as_str().strip_prefix(ATTRIBUTE_HEADER_PREFIX) else {
                continue;
            };
            let Ok(value) = value.to_str() else {
                continue;
            };
            attributes
                .entry(attribute.to_string())
                .or_default()
                .push(value.to_string());
        }
        Ok(attributes)
    }
}

/// First value of the user id attribute.
///
/// Header names arrive lower-cased, so the attribute name is matched
/// ignoring ASCII case.
pub fn resolve_user_id(
    attributes: &Attributes,
    userid_attr: &str,
) -> Result<String, AuthenticationError> {
    attributes
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(userid_attr))
        .and_then(|(_, values)| values.first())
        .cloned()
        .ok_or(AuthenticationError::MissingUserId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn rejects_requests_without_matching_source() {
        let auth = HeaderAuthenticator::new("login-admin");
        assert_eq!(
            auth.authenticate(&headers(&[])),
            Err(AuthenticationError::NotAuthenticated("login-admin".into()))
        );
        assert_eq!(
            auth.authenticate(&headers(&[(AUTH_SOURCE_HEADER, "other-source")])),
            Err(AuthenticationError::NotAuthenticated("login-admin".into()))
        );
    }

    #[test]
    fn collects_multi_valued_attributes() {
        let auth = HeaderAuthenticator::new("login-admin");
        let attributes = auth
            .authenticate(&headers(&[
                (AUTH_SOURCE_HEADER, "login-admin"),
                ("x-auth-attr-edupersonprincipalname", "alice@example.org"),
                ("x-auth-attr-mail", "alice@example.org"),
                ("x-auth-attr-mail", "a@example.org"),
                ("accept", "text/html"),
            ]))
            .unwrap();

        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes["mail"], vec!["alice@example.org", "a@example.org"]);
    }

    #[test]
    fn user_id_is_the_first_value_of_the_configured_attribute() {
        let mut attributes = Attributes::new();
        attributes.insert(
            "edupersonprincipalname".into(),
            vec!["alice@example.org".into(), "ignored".into()],
        );
        assert_eq!(
            resolve_user_id(&attributes, "eduPersonPrincipalName").as_deref(),
            Ok("alice@example.org")
        );
    }

    #[test]
    fn missing_or_empty_attribute_is_an_error() {
        let mut attributes = Attributes::new();
        assert_eq!(
            resolve_user_id(&attributes, "uid"),
            Err(AuthenticationError::MissingUserId)
        );
        attributes.insert("uid".into(), Vec::new());
        assert_eq!(
            resolve_user_id(&attributes, "uid"),
            Err(AuthenticationError::MissingUserId)
        );
    }
}
