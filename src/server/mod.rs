// Server module - hyper HTTP/1 server in front of the origin service

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::metrics::Metrics;
use crate::origin::{OriginRequest, OriginResponse, OriginService};

const HEALTH_PATH: &str = "/health";
const METRICS_PATH: &str = "/metrics";

/// Shared per-connection state
struct AppState {
    service: OriginService,
    request_timeout: Option<Duration>,
}

/// HTTP front end for [`OriginService`]
pub struct OriginServer {
    state: Arc<AppState>,
    bind_address: String,
}

impl OriginServer {
    pub fn new(service: OriginService, config: &ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                request_timeout: config.request_timeout(),
            }),
            bind_address: config.bind_address(),
        }
    }

    /// Bind and serve until Ctrl-C
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.bind_address).await?;
        tracing::info!(address = %self.bind_address, "Starting Hikari origin server");

        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Accept connections on `listener` until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { Ok::<_, Infallible>(route(&state, req).await) }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await
                        {
                            tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
                        }
                    });
                }
            }
        }
    }
}

async fn route<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>> {
    if req.method() == Method::GET {
        match req.uri().path() {
            HEALTH_PATH => return text_response(StatusCode::OK, "OK", "text/plain"),
            METRICS_PATH => {
                return text_response(
                    StatusCode::OK,
                    Metrics::global().export_prometheus(),
                    "text/plain; version=0.0.4",
                )
            }
            _ => {}
        }
    }

    let request = to_origin_request(&req);
    let response = match state.request_timeout {
        Some(limit) => match tokio::time::timeout(limit, state.service.handle(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::error!(timeout_secs = limit.as_secs(), "Origin request timed out");
                Metrics::global().record_response(StatusCode::GATEWAY_TIMEOUT.as_u16());
                return text_response(StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout", "text/plain");
            }
        },
        None => state.service.handle(request).await,
    };

    to_http_response(response)
}

fn to_origin_request<B>(req: &Request<B>) -> OriginRequest {
    let mut request = OriginRequest::new(req.method().as_str(), req.uri().path());
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            request.insert_header(name.as_str(), value);
        }
    }
    request
}

fn to_http_response(response: OriginResponse) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http_response = Response::new(Full::new(response.body));
    *http_response.status_mut() = status;
    http_response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(response.content_type),
    );
    http_response
}

fn text_response(
    status: StatusCode,
    body: impl Into<Bytes>,
    content_type: &'static str,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type),
    );
    response
}
