use std::collections::HashSet;
use std::sync::Arc;

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Static split of method names into public and private. Everything not on
/// the allow-list is private.
#[derive(Debug, Clone, Default)]
pub struct MethodPolicy {
    public: Arc<HashSet<String>>,
}

impl MethodPolicy {
    pub fn new<I, S>(public_methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public: Arc::new(public_methods.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_public(&self, method: &str) -> bool {
        self.public.contains(method)
    }
}

/// True when the request carries the configured admin token. With no token
/// configured there is no privileged HTTP channel.
pub fn is_privileged(headers: &HeaderMap, admin_token: Option<&str>) -> bool {
    let Some(expected) = admin_token else {
        return false;
    };
    let Some(presented) = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn only_allow_listed_methods_are_public() {
        let policy = MethodPolicy::new(["set_password"]);
        assert!(policy.is_public("set_password"));
        assert!(!policy.is_public("delete_user"));
        assert!(!policy.is_public("SET_PASSWORD"));
        assert!(!MethodPolicy::default().is_public("ping"));
    }

    #[test]
    fn privileged_requires_matching_token() {
        let mut headers = HeaderMap::new();
        assert!(!is_privileged(&headers, Some("s3cret")));

        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("wrong"));
        assert!(!is_privileged(&headers, Some("s3cret")));

        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert!(is_privileged(&headers, Some("s3cret")));
        assert!(!is_privileged(&headers, None));
    }
}
