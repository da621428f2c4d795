//! HTTP client side of the CouchDB streak store.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use tracing::debug;

use crate::{
    dao::{models::Identity, storage::StorageResult, streak_store::StreakStore},
    state::streak::StreakState,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchStreakDocument, streak_doc_id},
};

/// Cloud streak store keeping one CouchDB document per user.
#[derive(Clone)]
pub struct CouchStreakStore {
    client: Client,
    base_url: Url,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchStreakStore {
    /// Build the client and make sure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url,
            database: Arc::<str>::from(config.database),
            auth: config
                .credentials
                .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass))),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn database_request(&self, method: Method) -> reqwest::RequestBuilder {
        let url = resource_url(&self.base_url, &[self.database.as_ref()]);
        self.authorized(self.client.request(method, url))
    }

    fn document_request(&self, method: Method, doc_id: &str) -> reqwest::RequestBuilder {
        let url = resource_url(&self.base_url, &[self.database.as_ref(), doc_id]);
        self.authorized(self.client.request(method, url))
    }

    async fn database_status(&self, method: Method) -> CouchResult<StatusCode> {
        self.database_request(method)
            .send()
            .await
            .map(|response| response.status())
            .map_err(|source| CouchDaoError::Database {
                database: self.database.to_string(),
                source,
            })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        match self.database_status(Method::GET).await? {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = self.database_status(Method::PUT).await?;
                // 412: created concurrently by another instance.
                if created.is_success() || created == StatusCode::PRECONDITION_FAILED {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database: self.database.to_string(),
                        status: created,
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database: self.database.to_string(),
                status: other,
            }),
        }
    }

    async fn get_document(&self, doc_id: &str) -> CouchResult<Option<CouchStreakDocument>> {
        let response = self
            .document_request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::Send {
                doc_id: doc_id.to_owned(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchStreakDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::Decode {
                    doc_id: doc_id.to_owned(),
                    source,
                }),
            status => Err(CouchDaoError::Status {
                doc_id: doc_id.to_owned(),
                status,
            }),
        }
    }

    async fn put_document(&self, document: &CouchStreakDocument) -> CouchResult<()> {
        let response = self
            .document_request(Method::PUT, &document.id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Send {
                doc_id: document.id.clone(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                doc_id: document.id.clone(),
            }),
            status => Err(CouchDaoError::Status {
                doc_id: document.id.clone(),
                status,
            }),
        }
    }
}

impl StreakStore for CouchStreakStore {
    fn load(&self, identity: &Identity) -> BoxFuture<'static, StorageResult<StreakState>> {
        let store = self.clone();
        let doc_id = streak_doc_id(identity);
        Box::pin(async move {
            let document = store.get_document(&doc_id).await?;
            Ok(document.map(|doc| doc.to_state()).unwrap_or_default())
        })
    }

    fn save(&self, identity: &Identity, state: StreakState) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let doc_id = streak_doc_id(identity);
        let email = identity.email().map(str::to_owned);
        Box::pin(async move {
            let mut document = store
                .get_document(&doc_id)
                .await?
                .unwrap_or_else(|| CouchStreakDocument::empty(doc_id.clone()));
            document.apply(&state, email.as_deref());
            store.put_document(&document).await?;
            debug!(%doc_id, current = state.current_streak, "saved streak document");
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            match store.database_status(Method::GET).await? {
                status if status.is_success() => Ok(()),
                status => Err(CouchDaoError::DatabaseStatus {
                    database: store.database.to_string(),
                    status,
                }
                .into()),
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

fn parse_base_url(raw: &str) -> CouchResult<Url> {
    let invalid = |reason: String| CouchDaoError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason,
    };
    let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) URL".into()));
    }
    Ok(url)
}

/// `base` with each segment appended as one escaped path segment.
fn resource_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_stay_one_path_segment() {
        let base = parse_base_url("http://couch.local:5984/").unwrap();

        let url = resource_url(&base, &["streaks", "streak:a/b?c#d"]);

        assert_eq!(url.path(), "/streaks/streak:a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let base = parse_base_url("https://proxy.local/couch").unwrap();

        let url = resource_url(&base, &["streaks"]);

        assert_eq!(url.as_str(), "https://proxy.local/couch/streaks");
    }

    #[test]
    fn non_http_base_is_rejected() {
        assert!(matches!(
            parse_base_url("mailto:admin@couch.local"),
            Err(CouchDaoError::InvalidBaseUrl { .. })
        ));
        assert!(parse_base_url("not a url").is_err());
    }
}
