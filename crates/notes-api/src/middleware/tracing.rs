//! Per-request tracing span.
//!
//! Every request runs inside an `http_request` span carrying the method, the
//! path and a generated request id. The id is echoed back in `x-request-id`
//! so client reports can be matched to server logs. Headers and bodies are
//! never recorded.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    response::Response,
};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, info_span, Instrument, Span};
use uuid::Uuid;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Layer that opens a span for each request
#[derive(Debug, Clone, Default)]
pub struct RequestSpanLayer;

impl RequestSpanLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestSpanLayer {
    type Service = RequestSpanService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestSpanService { inner }
    }
}

/// Request span service
#[derive(Debug, Clone)]
pub struct RequestSpanService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestSpanService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let request_id = Uuid::now_v7().to_string();
        let span = info_span!(
            "http_request",
            http.method = %req.method(),
            http.path = %req.uri().path(),
            request_id = %request_id,
            http.status_code = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let result = inner.call(req).await;

                match result {
                    Ok(mut response) => {
                        let status = response.status();
                        Span::current().record("http.status_code", status.as_u16());
                        if let Ok(value) = HeaderValue::from_str(&request_id) {
                            response
                                .headers_mut()
                                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                        }
                        debug!(status = status.as_u16(), "request completed");
                        Ok(response)
                    }
                    Err(e) => Err(e),
                }
            }
            .instrument(span),
        )
    }
}
