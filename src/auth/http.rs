use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use super::{AuthError, IdentityResolver, ResolvedUser};

const API_KEY_HEADER: &str = "x-api-key";

/// Identity resolver querying an HTTP identity service.
///
/// Sends the caller's bearer token on a GET to the configured endpoint and
/// expects a JSON body describing the user. A service key can be attached
/// for deployments that require one.
#[derive(Clone)]
pub struct HttpIdentityResolver {
    client: Client,
    endpoint: Arc<str>,
    api_key: Option<Arc<str>>,
}

#[derive(Deserialize)]
struct IdentityResponse {
    id: String,
    email: Option<String>,
}

impl HttpIdentityResolver {
    /// Build the resolver for the given endpoint.
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: Arc::from(endpoint.trim_end_matches('/')),
            api_key: api_key.map(Arc::from),
        })
    }

    async fn lookup(&self, token: String) -> Result<ResolvedUser, AuthError> {
        let mut builder = self
            .client
            .get(self.endpoint.as_ref())
            .header(AUTHORIZATION, format!("Bearer {token}"));
        if let Some(ref key) = self.api_key {
            builder = builder.header(API_KEY_HEADER, key.as_ref());
        }

        let response = builder.send().await.map_err(AuthError::Unreachable)?;
        match response.status() {
            StatusCode::OK => {
                let identity: IdentityResponse =
                    response.json().await.map_err(AuthError::Unreachable)?;
                debug!(user_id = %identity.id, "credential resolved");
                Ok(ResolvedUser {
                    id: identity.id,
                    email: identity.email,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Err(
                AuthError::InvalidCredential("credential rejected by the identity service".into()),
            ),
            other => Err(AuthError::UpstreamStatus(other)),
        }
    }
}

impl IdentityResolver for HttpIdentityResolver {
    fn resolve(&self, token: String) -> BoxFuture<'static, Result<ResolvedUser, AuthError>> {
        let resolver = self.clone();
        Box::pin(async move { resolver.lookup(token).await })
    }
}
