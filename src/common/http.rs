use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_rustls::builderstates::WantsSchemes;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::tuning::HttpOptions;

/// Hyper client shared by every OCS, CardDAV and login call.
pub type HyperClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

fn roots(options: &HttpOptions) -> HttpsConnectorBuilder<WantsSchemes> {
    if options.native_roots {
        match HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => return builder,
            Err(err) => tracing::debug!("native roots unavailable, using webpki roots: {err}"),
        }
    }
    HttpsConnectorBuilder::new().with_webpki_roots()
}

/// Pooled client for Nextcloud instances.
///
/// `http://` stays allowed for instances behind a local proxy. Pool size, idle
/// timeout and HTTP/2 come from [`HttpOptions`].
pub fn build_hyper_client(options: &HttpOptions) -> Result<HyperClient> {
    let connector = roots(options).https_or_http().enable_http1();
    let https = if options.http2 {
        connector.enable_http2().build()
    } else {
        connector.build()
    };

    Ok(Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(options.pool_max_idle_per_host)
        .pool_idle_timeout(options.pool_idle_timeout)
        .pool_timer(TokioTimer::new())
        .build::<_, Full<Bytes>>(https))
}
