use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inbound request active while an event was recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Authenticated user of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// Source of the request/user active in the caller's execution context.
///
/// Passed explicitly to the record builder. Both lookups are reads and
/// must be safe to call from several threads at once; returning `None`
/// just leaves the corresponding record fields unset.
pub trait AmbientContext: Send + Sync {
    fn current_request(&self) -> Option<RequestContext>;

    /// Authenticated user of `request`, if any.
    fn user_for(&self, request: &RequestContext) -> Option<UserContext> {
        let _ = request;
        None
    }
}

/// Fixed request/user pair, e.g. built once per handled request.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    pub request: Option<RequestContext>,
    pub user: Option<UserContext>,
}

impl StaticContext {
    pub fn new(request: RequestContext) -> Self {
        StaticContext {
            request: Some(request),
            user: None,
        }
    }

    pub fn with_user(mut self, user: UserContext) -> Self {
        self.user = Some(user);
        self
    }
}

impl AmbientContext for StaticContext {
    fn current_request(&self) -> Option<RequestContext> {
        self.request.clone()
    }

    fn user_for(&self, _request: &RequestContext) -> Option<UserContext> {
        self.user.clone()
    }
}
