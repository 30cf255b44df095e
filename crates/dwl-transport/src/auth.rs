use std::sync::RwLock;

/// Supplies authorization headers for outgoing requests.
///
/// Queried once per request, never cached by the transport.
pub trait AuthHeaderProvider: Send + Sync {
    fn headers(&self) -> Vec<(String, String)>;
}

impl<F> AuthHeaderProvider for F
where
    F: Fn() -> Vec<(String, String)> + Send + Sync,
{
    fn headers(&self) -> Vec<(String, String)> {
        self()
    }
}

/// Sends no authorization headers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuth;

impl AuthHeaderProvider for NoAuth {
    fn headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Header set that can be replaced while transports hold a reference to it.
#[derive(Debug, Default)]
pub struct StaticAuthHeaders {
    headers: RwLock<Vec<(String, String)>>,
}

impl StaticAuthHeaders {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Header set holding `Authorization: Bearer <token>`.
    pub fn bearer(token: &str) -> Self {
        let provider = Self::new();
        provider.set_bearer_token(token);
        provider
    }

    /// Replace the `Authorization` header with a bearer token.
    pub fn set_bearer_token(&self, token: &str) {
        self.set_header("Authorization", &format!("Bearer {token}"));
    }

    /// Insert or replace a header. Names compare case-insensitively.
    pub fn set_header(&self, name: &str, value: &str) {
        let mut headers = self.headers.write().expect("auth header lock poisoned");
        headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        headers.push((name.to_string(), value.to_string()));
    }

    /// Remove every header.
    pub fn clear(&self) {
        self.headers.write().expect("auth header lock poisoned").clear();
    }
}

impl AuthHeaderProvider for StaticAuthHeaders {
    fn headers(&self) -> Vec<(String, String)> {
        self.headers.read().expect("auth header lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_auth_is_empty() {
        assert!(NoAuth.headers().is_empty());
    }

    #[test]
    fn bearer_sets_authorization() {
        let auth = StaticAuthHeaders::bearer("abc");
        assert_eq!(auth.headers(), vec![("Authorization".to_string(), "Bearer abc".to_string())]);
    }

    #[test]
    fn refresh_replaces_existing_header() {
        let auth = StaticAuthHeaders::bearer("old");
        auth.set_header("X-Tenant", "t1");
        auth.set_header("authorization", "Bearer new");
        let headers = auth.headers();
        assert_eq!(headers.len(), 2);
        assert!(headers.contains(&("authorization".to_string(), "Bearer new".to_string())));
        auth.clear();
        assert!(auth.headers().is_empty());
    }

    #[test]
    fn closures_are_providers() {
        let provider = || vec![("X-Api-Key".to_string(), "k".to_string())];
        assert_eq!(provider.headers().len(), 1);
    }
}
