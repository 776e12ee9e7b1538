use crate::{FileManagerErr, S3_COLLECTION_SEGMENTS};
use bytes::Bytes;
use reqwest::{
    Method, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use std::borrow::Cow;
use url::Url;


/// A request to the file manager which is still being configured.
///
/// Every step consumes the request and hands back the updated one, so a partially configured
/// request can be cloned and finished in different ways.
#[derive(Clone, Debug)]
#[must_use]
pub struct IndexRequest {
    client: reqwest::Client,
    endpoint: Url,
    method: Method,
    segments: Vec<&'static str>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Bytes,
}

/// The outcome of a completed round trip. Non-success statuses are reported here, not as errors.
#[derive(Clone, Debug)]
pub struct IndexResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl IndexResponse {
    /// The response body as text, replacing any invalid utf-8.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl IndexRequest {
    pub(crate) fn new(client: reqwest::Client, endpoint: Url, body: Bytes) -> Self {
        IndexRequest {
            client,
            endpoint,
            method: Method::GET,
            segments: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_method(self, method: Method) -> Self {
        IndexRequest { method, ..self }
    }

    /// Targets the s3 object collection, which supports querying and bulk updates.
    pub fn with_target_collection(self) -> Self {
        IndexRequest {
            segments: S3_COLLECTION_SEGMENTS.to_vec(),
            ..self
        }
    }

    /// Sets query parameters. Keys that appear in `params` replace any values previously set for
    /// them; a key may be given more than once to send multiple values.
    pub fn with_query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        self.query
            .retain(|(existing, _)| !params.iter().any(|(key, _)| key == existing));
        self.query.extend(params);
        self
    }

    /// Appends a header, keeping any existing values for the same name.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header(AUTHORIZATION.as_str(), format!("Bearer {token}"))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The full url this request will be sent to, including the encoded query.
    pub fn url(&self) -> Result<Url, FileManagerErr> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FileManagerErr::NotABaseUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(&self.segments);

        if self.query.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(&self.query);
        }

        Ok(url)
    }

    fn header_map(&self) -> Result<HeaderMap, FileManagerErr> {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                FileManagerErr::InvalidHeader {
                    name: key.clone(),
                    reason: e.to_string(),
                }
            })?;
            let mut value =
                HeaderValue::from_str(value).map_err(|e| FileManagerErr::InvalidHeader {
                    name: key.clone(),
                    reason: e.to_string(),
                })?;
            if name == AUTHORIZATION {
                value.set_sensitive(true);
            }
            headers.append(name, value);
        }
        Ok(headers)
    }

    /// Materialises the request without sending it.
    pub fn build(&self) -> Result<reqwest::Request, FileManagerErr> {
        let request = self
            .client
            .request(self.method.clone(), self.url()?)
            .headers(self.header_map()?)
            .body(self.body.clone())
            .build()?;

        Ok(request)
    }

    /// Sends the request and reads the whole response body, whatever the status.
    #[tracing::instrument(err, skip(self), fields(method = %self.method))]
    pub async fn dispatch(self) -> Result<IndexResponse, FileManagerErr> {
        let request = self.build()?;
        tracing::debug!(url = %request.url(), "dispatching file manager request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(%status, body_len = body.len(), "file manager responded");

        Ok(IndexResponse { status, body })
    }
}
