/* src/middleware.rs */

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::geo::GeoRecord;
use crate::guard::GeoGuard;
use crate::policy::Decision;

/// Extension that holds the resolved client address and its geo record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientGeo {
    pub ip: String,
    pub record: GeoRecord,
}

/// Layer that annotates requests with geo headers and enforces ban/whitelist policy.
///
/// Rejected requests get an empty `403 Forbidden` and never reach the inner service.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use geoguard::{Config, GeoGuard, GeoGuardLayer};
///
/// let guard = GeoGuard::new(Config::default().with_db_path("ip2region.xdb")).unwrap();
/// let app: Router = Router::new()
///     .route("/", get(|| async { "hello" }))
///     .layer(GeoGuardLayer::new(guard));
/// ```
#[derive(Debug, Clone)]
pub struct GeoGuardLayer {
    guard: Arc<GeoGuard>,
}

impl GeoGuardLayer {
    /// Create a layer owning `guard`.
    pub fn new(guard: GeoGuard) -> Self {
        Self {
            guard: Arc::new(guard),
        }
    }

    /// Share one guard, and its cache, between several layers.
    pub fn from_shared(guard: Arc<GeoGuard>) -> Self {
        Self { guard }
    }
}

impl<S> Layer<S> for GeoGuardLayer {
    type Service = GeoGuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GeoGuardService {
            inner,
            guard: Arc::clone(&self.guard),
        }
    }
}

/// Service produced by [`GeoGuardLayer`].
#[derive(Debug, Clone)]
pub struct GeoGuardService<S> {
    inner: S,
    guard: Arc<GeoGuard>,
}

impl<S> Service<Request> for GeoGuardService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect_info| connect_info.0.to_string())
            .unwrap_or_default();

        let verdict = self.guard.inspect(req.headers_mut(), &remote_addr);
        if verdict.decision == Decision::Reject {
            tracing::debug!(ip = %verdict.ip, "rejecting request");
            return Box::pin(async { Ok::<_, S::Error>(StatusCode::FORBIDDEN.into_response()) });
        }

        req.extensions_mut().insert(ClientGeo {
            ip: verdict.ip,
            record: verdict.record,
        });

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}

/// Axum extractor for the client geo record.
///
/// Without [`GeoGuardLayer`] it yields the peer IP, if known, and an empty record.
impl<S> FromRequestParts<S> for ClientGeo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(geo) = parts.extensions.get::<ClientGeo>() {
            return Ok(geo.clone());
        }

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect_info| connect_info.0.ip().to_string())
            .unwrap_or_default();
        Ok(ClientGeo {
            ip,
            record: GeoRecord::default(),
        })
    }
}
