// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP(S) server dispatching admission reviews to registered handlers.

use crate::constants::webhook::{CERT_FILE, DEFAULT_PORT, HEALTH_PATH, KEY_FILE, MAX_REVIEW_BYTES};
use crate::error::{Result, RiggerError};
use crate::webhook::admission::{AdmissionHandler, AdmissionReview};
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper_util::rt::TokioIo;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, instrument, warn};

/// Something admission handlers can be registered with.
pub trait WebhookServer: Send + Sync {
    fn register(&self, path: &str, handler: Arc<dyn AdmissionHandler>) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct WebhookServerOptions {
    pub host: IpAddr,
    pub port: u16,
    /// Directory holding `tls.crt` and `tls.key`. Without it the server speaks plain HTTP.
    pub cert_dir: Option<PathBuf>,
}

impl Default for WebhookServerOptions {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            cert_dir: None,
        }
    }
}

pub struct HttpsWebhookServer {
    options: WebhookServerOptions,
    hooks: RwLock<BTreeMap<String, Arc<dyn AdmissionHandler>>>,
}

impl WebhookServer for HttpsWebhookServer {
    fn register(&self, path: &str, handler: Arc<dyn AdmissionHandler>) -> Result<()> {
        let mut hooks = self.hooks.write()?;
        if hooks.contains_key(path) {
            return Err(RiggerError::WebhookPathConflict(path.to_string()));
        }
        debug!("Registered webhook at {}", path);
        hooks.insert(path.to_string(), handler);
        Ok(())
    }
}

impl HttpsWebhookServer {
    pub fn new(options: WebhookServerOptions) -> Self {
        Self {
            options,
            hooks: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn paths(&self) -> Vec<String> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn has_hooks(&self) -> bool {
        !self.hooks.read().unwrap_or_else(PoisonError::into_inner).is_empty()
    }

    /// Accept connections until the listener fails
    #[instrument(skip(self), fields(port = self.options.port))]
    pub async fn serve(self: Arc<Self>) -> Result<()> {
        let addr = SocketAddr::new(self.options.host, self.options.port);
        let acceptor = match &self.options.cert_dir {
            Some(dir) => Some(tls_acceptor(dir).await?),
            None => {
                warn!("No webhook cert dir configured, serving plain HTTP");
                None
            }
        };

        let listener = TcpListener::bind(addr).await?;
        info!("Webhook server listening on {} for {:?}", addr, self.paths());

        loop {
            let (stream, peer) = listener.accept().await?;
            let server = Arc::clone(&self);
            let acceptor = acceptor.clone();

            tokio::spawn(async move {
                match acceptor {
                    Some(acceptor) => match acceptor.accept(stream).await {
                        Ok(tls_stream) => server.serve_connection(tls_stream).await,
                        Err(e) => warn!("TLS handshake with {} failed: {}", peer, e),
                    },
                    None => server.serve_connection(stream).await,
                }
            });
        }
    }

    async fn serve_connection<IO>(self: Arc<Self>, io: IO)
    where
        IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let service = hyper::service::service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&self);
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        if let Err(e) = hyper::server::conn::http1::Builder::new()
            .serve_connection(TokioIo::new(io), service)
            .await
        {
            error!("Webhook connection error: {}", e);
        }
    }

    async fn handle_request<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match Limited::new(req.into_body(), MAX_REVIEW_BYTES).collect().await {
            Ok(collected) => self.dispatch(&method, &path, &collected.to_bytes()),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                warn!("Request body for {} exceeds {} bytes", path, MAX_REVIEW_BYTES);
                respond_text(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
            }
            Err(e) => {
                warn!("Failed to read request body: {}", e);
                respond_text(StatusCode::BAD_REQUEST, "failed to read request body")
            }
        }
    }

    /// Route one request to the handler registered for its path
    pub fn dispatch(&self, method: &Method, path: &str, body: &[u8]) -> Response<Full<Bytes>> {
        if path == HEALTH_PATH {
            return respond_text(StatusCode::OK, "ok");
        }

        let handler = self
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned();
        let Some(handler) = handler else {
            return respond_text(StatusCode::NOT_FOUND, "no webhook registered at this path");
        };

        if method != Method::POST {
            return respond_text(StatusCode::METHOD_NOT_ALLOWED, "admission reviews must be POSTed");
        }

        let review: AdmissionReview = match serde_json::from_slice(body) {
            Ok(review) => review,
            Err(e) => {
                warn!("Failed to parse AdmissionReview for {}: {}", path, e);
                return respond_text(StatusCode::BAD_REQUEST, "invalid AdmissionReview");
            }
        };

        let Some(request) = review.request else {
            return respond_text(StatusCode::BAD_REQUEST, "AdmissionReview carries no request");
        };

        debug!("Handling {:?} admission request {} at {}", request.operation, request.uid, path);
        let response = handler.handle(&request);

        match serde_json::to_vec(&AdmissionReview::respond(response)) {
            Ok(json) => respond(StatusCode::OK, "application/json", json),
            Err(e) => {
                error!("Failed to serialize admission response: {}", e);
                respond_text(StatusCode::INTERNAL_SERVER_ERROR, "failed to serialize response")
            }
        }
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn respond_text(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    respond(status, "text/plain; charset=utf-8", message)
}

async fn tls_acceptor(cert_dir: &Path) -> Result<TlsAcceptor> {
    let cert_pem = tokio::fs::read(cert_dir.join(CERT_FILE)).await?;
    let key_pem = tokio::fs::read(cert_dir.join(KEY_FILE)).await?;

    let certs = rustls_pemfile::certs(&mut cert_pem.as_slice()).collect::<std::result::Result<Vec<_>, _>>()?;
    let key = rustls_pemfile::private_key(&mut key_pem.as_slice())?.ok_or_else(|| {
        RiggerError::WebhookServerError(format!(
            "no private key found in {}",
            cert_dir.join(KEY_FILE).display()
        ))
    })?;

    // Ignored when a provider is already installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let mut tls_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    tls_config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(tls_config)))
}
