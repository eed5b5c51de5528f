// ABOUTME: XML-RPC client for the OpenNebula API over HTTP(S).
// ABOUTME: Implements ImageOps using hyper with rustls for TLS endpoints.

use super::error::RpcError;
use super::image::{Image, parse_image, parse_image_pool};
use super::sealed::Sealed;
use super::traits::ImageOps;
use super::xmlrpc::{Value, decode_response, encode_call};
use crate::config::ConnectionConfig;
use crate::types::{ImageId, ImageName};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

/// Pool filter meaning "all images the session user can use".
const POOL_FILTER_USABLE: i64 = -2;

/// Datastore argument meaning "same datastore as the source image".
const SOURCE_DATASTORE: i64 = -1;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_transport_error(e: impl std::fmt::Display) -> RpcError {
    RpcError::Transport(e.to_string())
}

fn map_call_failure(method: &str, items: &[Value]) -> RpcError {
    let message = items
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or("no error message")
        .to_string();
    let code = items.get(2).and_then(Value::as_i64).unwrap_or_default();
    RpcError::Call {
        method: method.to_string(),
        code,
        message,
    }
}

fn expect_string(method: &str, value: Value) -> Result<String, RpcError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(RpcError::malformed(format!(
            "{method} returned {other:?}, expected a string"
        ))),
    }
}

fn expect_id(method: &str, value: Value) -> Result<ImageId, RpcError> {
    value
        .as_i64()
        .and_then(|id| u32::try_from(id).ok())
        .map(ImageId::new)
        .ok_or_else(|| {
            RpcError::malformed(format!("{method} returned {value:?}, expected an id"))
        })
}

// =============================================================================
// Client
// =============================================================================

/// OpenNebula XML-RPC client.
pub struct OneClient {
    endpoint: Uri,
    session: String,
    http: HttpClient,
    request_timeout: Duration,
}

impl Sealed for OneClient {}

impl OneClient {
    /// Build a client for the endpoint in `connection`.
    ///
    /// No request is made until the first call.
    pub fn connect(connection: &ConnectionConfig) -> Result<Self, RpcError> {
        let endpoint = connection
            .url
            .parse::<Uri>()
            .map_err(|e| RpcError::InvalidEndpoint {
                url: connection.url.clone(),
                reason: e.to_string(),
            })?;

        match endpoint.scheme_str() {
            Some("http") | Some("https") => {}
            _ => {
                return Err(RpcError::InvalidEndpoint {
                    url: connection.url.clone(),
                    reason: "scheme must be http or https".to_string(),
                });
            }
        }

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let http = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            endpoint,
            session: connection.session(),
            http,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Override the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Invoke an OpenNebula method and unwrap its `[success, value, code]`
    /// envelope.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let mut all_params = Vec::with_capacity(params.len() + 1);
        all_params.push(Value::String(self.session.clone()));
        all_params.extend(params);

        tracing::debug!(method, "calling OpenNebula");
        let body = encode_call(method, &all_params)?;
        let response = tokio::time::timeout(self.request_timeout, self.post(body))
            .await
            .map_err(|_| RpcError::Timeout(self.request_timeout))??;

        let items = match decode_response(&response)? {
            Value::Array(items) => items,
            other => {
                return Err(RpcError::malformed(format!(
                    "{method} returned {other:?}, expected an array"
                )));
            }
        };

        match items.first().and_then(Value::as_bool) {
            Some(true) => items
                .into_iter()
                .nth(1)
                .ok_or_else(|| RpcError::malformed(format!("{method} returned no value"))),
            Some(false) => Err(map_call_failure(method, &items)),
            None => Err(RpcError::malformed(format!(
                "{method} response has no success flag"
            ))),
        }
    }

    async fn post(&self, body: String) -> Result<String, RpcError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(Full::new(Bytes::from(body)))
            .map_err(map_transport_error)?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(map_transport_error)?
            .to_bytes();

        String::from_utf8(bytes.to_vec())
            .map_err(|e| RpcError::malformed(format!("response is not UTF-8: {e}")))
    }
}

#[async_trait]
impl ImageOps for OneClient {
    async fn list_images(&self) -> Result<Vec<Image>, RpcError> {
        const METHOD: &str = "one.imagepool.info";
        let params = vec![POOL_FILTER_USABLE.into(), (-1i64).into(), (-1i64).into()];
        let xml = expect_string(METHOD, self.call(METHOD, params).await?)?;
        parse_image_pool(&xml)
    }

    async fn image_info(&self, id: ImageId) -> Result<Image, RpcError> {
        const METHOD: &str = "one.image.info";
        let params = vec![id.get().into(), false.into()];
        let xml = expect_string(METHOD, self.call(METHOD, params).await?)?;
        parse_image(&xml)
    }

    async fn enable_image(&self, id: ImageId, enable: bool) -> Result<(), RpcError> {
        self.call("one.image.enable", vec![id.get().into(), enable.into()])
            .await
            .map(|_| ())
    }

    async fn clone_image(&self, id: ImageId, name: &ImageName) -> Result<ImageId, RpcError> {
        const METHOD: &str = "one.image.clone";
        let params = vec![
            id.get().into(),
            name.as_str().into(),
            SOURCE_DATASTORE.into(),
        ];
        expect_id(METHOD, self.call(METHOD, params).await?)
    }

    async fn rename_image(&self, id: ImageId, name: &ImageName) -> Result<(), RpcError> {
        self.call("one.image.rename", vec![id.get().into(), name.as_str().into()])
            .await
            .map(|_| ())
    }

    async fn delete_image(&self, id: ImageId) -> Result<(), RpcError> {
        self.call("one.image.delete", vec![id.get().into()])
            .await
            .map(|_| ())
    }
}
