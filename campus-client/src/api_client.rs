//! REST client for the console backend.

use crate::config::ClientConfig;
use crate::records::{Resource, StatusUpdate};
use crate::service::RecordMutator;
use async_trait::async_trait;
use campus_cache::CollectionFetcher;
use campus_core::{CollectionKey, FetchError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::marker::PhantomData;
use std::time::Duration;
use uuid::Uuid;

const INSTITUTION_HEADER: &str = "x-institution-id";

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    Config(String),
}

/// Error body returned by the backend on failure.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiClientError> {
        if base_url.trim().is_empty() {
            return Err(ApiClientError::Config("base url must not be empty".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiClientError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Typed view of this client for one resource collection.
    pub fn resource<R: Resource>(&self) -> ResourceClient<R> {
        ResourceClient {
            rest: self.clone(),
            _resource: PhantomData,
        }
    }

    pub async fn list<R: Resource>(&self, key: &CollectionKey) -> Result<Vec<R>, FetchError> {
        let response = self
            .request(Method::GET, key, &collection_path::<R>(key))?
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.parse_response(key, response).await
    }

    pub async fn create<R: Resource>(&self, key: &CollectionKey, record: &R) -> Result<R, FetchError> {
        let response = self
            .request(Method::POST, key, &collection_path::<R>(key))?
            .json(record)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.parse_response(key, response).await
    }

    pub async fn update<R: Resource>(&self, key: &CollectionKey, record: &R) -> Result<R, FetchError> {
        let path = record_path::<R>(key, record.record_id());
        let response = self
            .request(Method::PUT, key, &path)?
            .json(record)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.parse_response(key, response).await
    }

    pub async fn delete<R: Resource>(&self, key: &CollectionKey, id: Uuid) -> Result<(), FetchError> {
        let path = record_path::<R>(key, id);
        let response = self
            .request(Method::DELETE, key, &path)?
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.check_status(key, response).await.map(|_| ())
    }

    pub async fn set_status<R: Resource>(
        &self,
        key: &CollectionKey,
        id: Uuid,
        active: bool,
    ) -> Result<R, FetchError> {
        let path = format!("{}/status", record_path::<R>(key, id));
        let response = self
            .request(Method::PATCH, key, &path)?
            .json(&StatusUpdate { active })
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.parse_response(key, response).await
    }

    fn request(
        &self,
        method: Method,
        key: &CollectionKey,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        Ok(self.client.request(method, url).headers(auth_headers(key)?))
    }

    async fn check_status(
        &self,
        key: &CollectionKey,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, FetchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => match body.code {
                Some(code) => format!("{}: {}", code, body.message),
                None => body.message,
            },
            Err(_) => text,
        };

        tracing::debug!(institution = %key, status = status.as_u16(), "Request rejected");
        Err(map_status(key, status, message))
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        key: &CollectionKey,
        response: reqwest::Response,
    ) -> Result<T, FetchError> {
        let response = self.check_status(key, response).await?;
        response.json::<T>().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout { after: self.timeout }
        } else if err.is_decode() {
            FetchError::Decode {
                reason: err.to_string(),
            }
        } else {
            FetchError::Network {
                reason: err.to_string(),
            }
        }
    }
}

fn map_status(key: &CollectionKey, status: StatusCode, message: String) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Auth {
            institution: key.institution().to_string(),
            reason: if message.is_empty() {
                status.to_string()
            } else {
                message
            },
        },
        _ => FetchError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

fn collection_path<R: Resource>(key: &CollectionKey) -> String {
    format!(
        "/api/v1/institutions/{}/{}",
        key.institution().as_str(),
        R::COLLECTION
    )
}

fn record_path<R: Resource>(key: &CollectionKey, id: Uuid) -> String {
    format!("{}/{}", collection_path::<R>(key), id)
}

fn auth_headers(key: &CollectionKey) -> Result<HeaderMap, FetchError> {
    let invalid = |reason: String| FetchError::Auth {
        institution: key.institution().to_string(),
        reason,
    };

    let mut headers = HeaderMap::new();
    let bearer = format!("Bearer {}", key.token().expose());
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&bearer).map_err(|e| invalid(e.to_string()))?,
    );
    headers.insert(
        HeaderName::from_static(INSTITUTION_HEADER),
        HeaderValue::from_str(key.institution().as_str()).map_err(|e| invalid(e.to_string()))?,
    );
    Ok(headers)
}

/// [`RestClient`] bound to one resource type.
pub struct ResourceClient<R> {
    rest: RestClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            rest: self.rest.clone(),
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Resource> CollectionFetcher<R> for ResourceClient<R> {
    async fn fetch_collection(&self, key: &CollectionKey) -> Result<Vec<R>, FetchError> {
        self.rest.list::<R>(key).await
    }
}

#[async_trait]
impl<R: Resource> RecordMutator<R> for ResourceClient<R> {
    async fn create_record(&self, key: &CollectionKey, record: &R) -> Result<R, FetchError> {
        self.rest.create(key, record).await
    }

    async fn update_record(&self, key: &CollectionKey, record: &R) -> Result<R, FetchError> {
        self.rest.update(key, record).await
    }

    async fn delete_record(&self, key: &CollectionKey, id: Uuid) -> Result<(), FetchError> {
        self.rest.delete::<R>(key, id).await
    }

    async fn set_status(&self, key: &CollectionKey, id: Uuid, active: bool) -> Result<R, FetchError> {
        self.rest.set_status(key, id, active).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ClientRecord, UserRecord};
    use campus_core::InstitutionId;
    use campus_test_utils::generators::arb_collection_key;
    use proptest::prelude::*;

    fn key() -> CollectionKey {
        CollectionKey::parse("inst-1", "token-abc").unwrap()
    }

    #[test]
    fn test_paths() {
        let id = Uuid::nil();
        assert_eq!(
            collection_path::<UserRecord>(&key()),
            "/api/v1/institutions/inst-1/users"
        );
        assert_eq!(
            record_path::<ClientRecord>(&key(), id),
            format!("/api/v1/institutions/inst-1/clients/{}", id)
        );
    }

    #[test]
    fn test_auth_headers() {
        let headers = auth_headers(&key()).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer token-abc");
        assert_eq!(headers[INSTITUTION_HEADER], "inst-1");
    }

    #[test]
    fn test_auth_header_rejects_control_characters() {
        let key = CollectionKey::parse("inst-1", "bad\ntoken").unwrap();
        assert!(matches!(auth_headers(&key), Err(FetchError::Auth { .. })));
    }

    #[test]
    fn test_status_mapping() {
        let k = key();
        assert!(matches!(
            map_status(&k, StatusCode::UNAUTHORIZED, String::new()),
            FetchError::Auth { .. }
        ));
        assert!(matches!(
            map_status(&k, StatusCode::FORBIDDEN, "nope".into()),
            FetchError::Auth { reason, .. } if reason == "nope"
        ));
        assert!(matches!(
            map_status(&k, StatusCode::SERVICE_UNAVAILABLE, "down".into()),
            FetchError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            RestClient::new("  ", Duration::from_secs(1)),
            Err(ApiClientError::Config(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RestClient::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    proptest! {
        #[test]
        fn prop_institution_is_one_path_segment(key in arb_collection_key()) {
            let path = collection_path::<UserRecord>(&key);
            let url = reqwest::Url::parse(&format!("http://localhost{}", path)).unwrap();
            prop_assert_eq!(url.path(), path.as_str());
            let segments: Vec<&str> = url.path_segments().unwrap().collect();
            prop_assert_eq!(segments, vec!["api", "v1", "institutions", key.institution().as_str(), "users"]);
        }

        #[test]
        fn prop_accepted_ids_never_split_the_path(raw in "\\PC{1,16}") {
            if let Ok(institution) = InstitutionId::new(raw.clone()) {
                let key = CollectionKey::new(institution, key().token().clone());
                let path = collection_path::<ClientRecord>(&key);
                let url = reqwest::Url::parse(&format!("http://localhost{}", path)).unwrap();
                prop_assert!(url.query().is_none());
                prop_assert!(url.fragment().is_none());
                prop_assert_eq!(url.path_segments().unwrap().count(), 5);
                prop_assert!(url.path().ends_with("/clients"));
            }
        }

        #[test]
        fn prop_only_401_and_403_map_to_auth(code in 400u16..600, message in "[a-z ]{0,20}") {
            let status = StatusCode::from_u16(code).unwrap();
            match map_status(&key(), status, message.clone()) {
                FetchError::Auth { institution, .. } => {
                    prop_assert!(code == 401 || code == 403);
                    prop_assert_eq!(institution, "inst-1");
                }
                FetchError::Server { status, message: body } => {
                    prop_assert!(code != 401 && code != 403);
                    prop_assert_eq!(status, code);
                    prop_assert_eq!(body, message);
                }
                other => prop_assert!(false, "unexpected mapping {:?}", other),
            }
        }
    }
}
