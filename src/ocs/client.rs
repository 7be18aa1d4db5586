use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Method, Request, Uri, header};
use tokio::time::{Duration, timeout};
use url::Url;

use crate::common::compression::{add_accept_encoding, decompress_body, detect_encodings};
use crate::common::http::{HyperClient, build_hyper_client};
use crate::config::settings::Credentials;
use crate::config::tuning::HttpOptions;
use crate::ocs::types::{OcsBody, OcsResponse};

/// Build `{base}/{segments...}`, percent-encoding each segment.
///
/// A trailing empty segment yields a trailing slash (needed by the CardDAV export URL).
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| anyhow!("base URL {base} cannot carry a path"))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// `{base}/ocs/v2.php/apps/spreed/api/v4/room/{rest...}`.
pub fn spreed_room_url(base: &str, rest: &[&str]) -> Result<Url> {
    let mut segments = vec!["ocs", "v2.php", "apps", "spreed", "api", "v4", "room"];
    segments.extend_from_slice(rest);
    endpoint(base, &segments)
}

/// One outgoing request. Built with the chained setters below.
#[derive(Debug, Clone)]
pub struct OcsRequest<'a> {
    pub method: Method,
    pub url: Url,
    pub auth: Option<&'a Credentials>,
    pub body: OcsBody,
    pub accept: &'static str,
    pub verbose: bool,
}

impl<'a> OcsRequest<'a> {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            auth: None,
            body: OcsBody::Empty,
            accept: "application/json",
            verbose: false,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn auth(mut self, creds: &'a Credentials) -> Self {
        self.auth = Some(creds);
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = OcsBody::Json(value);
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = OcsBody::Form(pairs);
        self
    }

    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }

    /// Log response bodies at debug level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Thin OCS request helper on top of a pooled **hyper 1.x** + **rustls** client.
///
/// Adds the OCS headers and Basic auth, aggregates and decompresses the body, and
/// normalizes it into an [`OcsResponse`]. A non-2xx status is *not* an error here;
/// only transport failures and timeouts are.
///
/// Cloning is cheap and reuses the same connection pool.
#[derive(Clone)]
pub struct OcsClient {
    client: HyperClient,
    default_timeout: Duration,
}

impl OcsClient {
    pub fn new(default_timeout: Duration, http: &HttpOptions) -> Result<Self> {
        Ok(Self {
            client: build_hyper_client(http)?,
            default_timeout,
        })
    }

    pub fn basic_auth_value(creds: &Credentials) -> Result<header::HeaderValue> {
        let token = format!("{}:{}", creds.user, creds.app_pass);
        let mut value = header::HeaderValue::from_str(&format!("Basic {}", B64.encode(token)))?;
        value.set_sensitive(true);
        Ok(value)
    }

    pub async fn send(&self, request: OcsRequest<'_>) -> Result<OcsResponse> {
        let uri: Uri = request.url.as_str().parse()?;

        let mut headers = HeaderMap::new();
        headers.insert("OCS-APIRequest", header::HeaderValue::from_static("true"));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(request.accept),
        );
        add_accept_encoding(&mut headers);
        if let Some(creds) = request.auth {
            headers.insert(header::AUTHORIZATION, Self::basic_auth_value(creds)?);
        }

        let body = match &request.body {
            OcsBody::Empty => Bytes::new(),
            OcsBody::Json(value) => {
                headers.insert(
                    header::CONTENT_TYPE,
                    header::HeaderValue::from_static("application/json"),
                );
                Bytes::from(serde_json::to_vec(value)?)
            }
            OcsBody::Form(pairs) => {
                headers.insert(
                    header::CONTENT_TYPE,
                    header::HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish();
                Bytes::from(encoded)
            }
        };

        let mut req_builder = Request::builder()
            .method(request.method.clone())
            .uri(uri);
        for (k, v) in headers.iter() {
            req_builder = req_builder.header(k, v);
        }
        let req = req_builder.body(Full::new(body))?;

        tracing::debug!(method = %request.method, url = %request.url, "ocs request");
        let resp = timeout(self.default_timeout, self.client.request(req))
            .await
            .map_err(|_| anyhow!("request to {} timed out", request.url))??;

        let encodings = detect_encodings(resp.headers());
        let (parts, incoming) = resp.into_parts();
        let bytes = decompress_body(incoming, &encodings).await?;
        let response = OcsResponse::from_bytes(parts.status, &bytes);

        if request.verbose {
            tracing::debug!(
                status = parts.status.as_u16(),
                body = %response.raw,
                "ocs response"
            );
        } else {
            tracing::debug!(status = parts.status.as_u16(), "ocs response");
        }
        Ok(response)
    }
}
