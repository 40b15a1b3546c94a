//! Consent server for Google Drive access
//!
//! A tiny HTTP server with two routes:
//!
//! - `GET /auth` redirects the browser to the Google consent screen
//! - `GET /callback?code=...` exchanges the code, looks up the account
//!   e-mail and stores the refresh token under it
//!
//! The server runs next to the watch loop until the shutdown token fires.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::drive::DriveApi;
use super::oauth::GoogleOAuth;
use super::token_store::SqliteTokenStore;
use crate::StorageError;

/// HTTP server completing the Google OAuth consent flow
#[derive(Clone)]
pub struct ConsentServer {
    oauth: Arc<GoogleOAuth>,
    tokens: SqliteTokenStore,
    api: DriveApi,
}

impl ConsentServer {
    pub fn new(oauth: Arc<GoogleOAuth>, tokens: SqliteTokenStore) -> Self {
        Self::with_api(oauth, tokens, DriveApi::default())
    }

    /// Creates a server resolving e-mails against a custom Drive endpoint
    pub fn with_api(oauth: Arc<GoogleOAuth>, tokens: SqliteTokenStore, api: DriveApi) -> Self {
        Self { oauth, tokens, api }
    }

    /// Binds `addr` and serves until `shutdown` is cancelled
    pub async fn run(self, addr: &str, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr, "Google consent server listening");
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Accepts connections on `listener` until `shutdown` is cancelled
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "Failed to accept consent connection");
                    continue;
                }
            };

            let server = self.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let server = server.clone();
                    async move { Ok::<_, hyper::Error>(server.handle(req.method(), req.uri(), peer).await) }
                });
                if let Err(e) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    warn!(error = %e, "Consent server connection error");
                }
            });
        }
        debug!("Consent server stopped");
    }

    /// Routes one request
    pub async fn handle(
        &self,
        method: &Method,
        uri: &hyper::Uri,
        peer: SocketAddr,
    ) -> Response<Full<Bytes>> {
        debug!(%method, %uri, %peer, "Consent request");
        if method != Method::GET {
            return text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
        }

        match uri.path() {
            "/auth" => redirect(&self.oauth.authorize_url()),
            "/callback" => match query_param(uri, "code") {
                Some(code) => match self.complete(&code).await {
                    Ok(email) => {
                        info!(email = %email, "Stored Google refresh token");
                        text(StatusCode::OK, "Token saved successfully")
                    }
                    Err(e) => {
                        warn!(error = %e, "Consent callback failed");
                        text(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
                    }
                },
                None => text(StatusCode::BAD_REQUEST, "Missing authorization code"),
            },
            _ => text(StatusCode::NOT_FOUND, "Not found"),
        }
    }

    /// Exchanges `code` and stores the refresh token; returns the account e-mail
    async fn complete(&self, code: &str) -> Result<String, StorageError> {
        let granted = self.oauth.exchange_code(code).await?;
        let refresh = granted.refresh_token.ok_or_else(|| {
            StorageError::OAuth("no refresh token granted; revoke access and retry".to_string())
        })?;
        let email = self.api.account_email(&granted.access_token).await?;
        self.tokens
            .save(&email, &refresh, &granted.token_type)
            .await?;
        Ok(email)
    }
}

fn query_param(uri: &hyper::Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn text(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn redirect(location: &str) -> Response<Full<Bytes>> {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::FOUND;
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => text(StatusCode::INTERNAL_SERVER_ERROR, "Invalid consent URL"),
    }
}
