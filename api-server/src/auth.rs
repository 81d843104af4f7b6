use actix_web::http::header::{HeaderMap, AUTHORIZATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdminAccess {
    Granted,
    Denied,
    /// No admin key is configured, so operator routes are off.
    Disabled,
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let authorization = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = authorization.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed)
}

/// Accepts the key from `x-api-key` or an `Authorization: Bearer` header.
pub(crate) fn admin_access(headers: &HeaderMap, admin_api_key: Option<&str>) -> AdminAccess {
    let Some(expected) = admin_api_key else {
        return AdminAccess::Disabled;
    };

    let x_api_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::trim);
    if x_api_key == Some(expected) || bearer_token(headers) == Some(expected) {
        AdminAccess::Granted
    } else {
        AdminAccess::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn bearer_token_requires_bearer_scheme() {
        assert_eq!(
            bearer_token(&headers(&[("authorization", "Bearer abc")])),
            Some("abc")
        );
        assert_eq!(
            bearer_token(&headers(&[("authorization", "bearer  abc ")])),
            Some("abc")
        );
        assert_eq!(bearer_token(&headers(&[("authorization", "Basic abc")])), None);
        assert_eq!(bearer_token(&headers(&[("authorization", "Bearer ")])), None);
    }

    #[test]
    fn admin_key_from_either_header() {
        let key = Some("s3cret");
        assert_eq!(
            admin_access(&headers(&[("x-api-key", "s3cret")]), key),
            AdminAccess::Granted
        );
        assert_eq!(
            admin_access(&headers(&[("authorization", "Bearer s3cret")]), key),
            AdminAccess::Granted
        );
        assert_eq!(
            admin_access(&headers(&[("x-api-key", "nope")]), key),
            AdminAccess::Denied
        );
        assert_eq!(admin_access(&headers(&[]), key), AdminAccess::Denied);
    }

    #[test]
    fn operator_routes_are_off_without_a_key() {
        assert_eq!(
            admin_access(&headers(&[("x-api-key", "anything")]), None),
            AdminAccess::Disabled
        );
    }
}
