//! REST backend for hosted realtime databases.
//!
//! Every path maps to `{database_url}/{path}.json`; GET/PUT/PATCH/DELETE/POST
//! carry the document operations. Subscriptions poll the path at a fixed
//! interval and publish changed values.

use super::path::{is_info, parse_path, parse_update_paths, parse_writable_path};
use super::{RemoteStore, StoreError, StoreResult, Subscription, CONNECTED_PATH};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::watch;

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Connection options for [`RestRemoteStore`].
#[derive(Debug, Clone)]
pub struct RestOptions {
    /// Optional database secret or ID token appended as `auth=`.
    pub auth_token: Option<String>,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            auth_token: None,
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Remote store speaking the realtime database REST protocol.
#[derive(Clone)]
pub struct RestRemoteStore {
    client: Client,
    base_url: String,
    options: RestOptions,
}

impl RestRemoteStore {
    /// Builds a client for `database_url` (e.g. `https://<db>.firebasedatabase.app`).
    ///
    /// # Errors
    /// - `InvalidPath` when the URL is not http(s).
    /// - `Transport` when the HTTP client cannot be built.
    pub fn new(database_url: &str, options: RestOptions) -> StoreResult<Self> {
        let base_url = database_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(StoreError::InvalidPath(format!(
                "database url must be http(s), got `{base_url}`"
            )));
        }
        let client = Client::builder().timeout(options.request_timeout).build()?;
        Ok(Self {
            client,
            base_url,
            options,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[String]) -> String {
        if segments.is_empty() {
            format!("{}/.json", self.base_url)
        } else {
            format!("{}/{}.json", self.base_url, segments.join("/"))
        }
    }

    fn request(&self, method: Method, segments: &[String]) -> RequestBuilder {
        let builder = self.client.request(method, self.url(segments));
        match &self.options.auth_token {
            Some(token) => builder.query(&[("auth", token.as_str())]),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> StoreResult<Value> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Remote {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn fetch(&self, segments: &[String]) -> StoreResult<Option<Value>> {
        let value = self.send(self.request(Method::GET, segments)).await?;
        Ok((!value.is_null()).then_some(value))
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    fn backend_name(&self) -> &'static str {
        "rest"
    }

    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        let segments = parse_path(path)?;
        if is_info(&segments) {
            if segments.join("/") == CONNECTED_PATH {
                return Ok(Some(Value::Bool(self.is_connected().await)));
            }
            return Ok(None);
        }
        self.fetch(&segments).await
    }

    async fn set(&self, path: &str, value: Value) -> StoreResult<()> {
        let segments = parse_writable_path(path)?;
        debug!("event=store_set module=store backend=rest path={path}");
        self.send(self.request(Method::PUT, &segments).json(&value))
            .await?;
        Ok(())
    }

    async fn update(&self, path: &str, changes: Map<String, Value>) -> StoreResult<()> {
        let segments = parse_writable_path(path)?;
        parse_update_paths(path, &changes)?;
        if changes.is_empty() {
            return Ok(());
        }
        debug!(
            "event=store_update module=store backend=rest path={path} changes={}",
            changes.len()
        );
        self.send(self.request(Method::PATCH, &segments).json(&changes))
            .await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        let segments = parse_writable_path(path)?;
        debug!("event=store_remove module=store backend=rest path={path}");
        self.send(self.request(Method::DELETE, &segments)).await?;
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> StoreResult<String> {
        let segments = parse_writable_path(path)?;
        let response = self
            .send(self.request(Method::POST, &segments).json(&value))
            .await?;
        response
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Remote {
                status: 200,
                body: "push response is missing `name`".to_string(),
            })
    }

    async fn subscribe(&self, path: &str) -> StoreResult<Subscription> {
        let segments = parse_path(path)?;
        let initial = self.get(path).await?;
        let (sender, receiver) = watch::channel(initial);

        let store = self.clone();
        let poll_path = path.to_string();
        let poller = tokio::spawn(async move {
            loop {
                tokio::time::sleep(store.options.poll_interval).await;
                if sender.is_closed() {
                    break;
                }
                let next = if is_info(&segments) {
                    store.get(&poll_path).await
                } else {
                    store.fetch(&segments).await
                };
                match next {
                    Ok(next) => {
                        sender.send_if_modified(|current| {
                            if *current == next {
                                false
                            } else {
                                *current = next;
                                true
                            }
                        });
                    }
                    Err(err) => warn!(
                        "event=store_poll module=store backend=rest status=error path={poll_path} error={err}"
                    ),
                }
            }
        });

        Ok(Subscription::with_poller(path, receiver, poller))
    }

    async fn is_connected(&self) -> bool {
        let request = self
            .request(Method::GET, &[])
            .query(&[("shallow", "true")]);
        match self.send(request).await {
            Ok(_) => true,
            Err(err) => {
                debug!("event=store_probe module=store backend=rest status=error error={err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RestOptions, RestRemoteStore};

    #[test]
    fn url_appends_json_suffix() {
        let store =
            RestRemoteStore::new("https://board.example.app/", RestOptions::default()).unwrap();
        assert_eq!(store.base_url(), "https://board.example.app");
        assert_eq!(store.url(&[]), "https://board.example.app/.json");
        assert_eq!(
            store.url(&["tasks".to_string(), "t1".to_string()]),
            "https://board.example.app/tasks/t1.json"
        );
    }

    #[test]
    fn non_http_urls_are_rejected() {
        assert!(RestRemoteStore::new("ftp://board", RestOptions::default()).is_err());
        assert!(RestRemoteStore::new("", RestOptions::default()).is_err());
    }
}
