//! Tower middleware gating every RPC on the permission named after it.
//!
//! The authentication layer in front of this one is expected to have
//! placed the `CallerIdentity` into the request extensions.  Requests
//! that fail the check never reach the inner service; the caller gets a
//! gRPC trailers-only response carrying the status instead.

use http::{
    header,
    HeaderName,
    HeaderValue,
    Request,
    Response,
};
use jobcore::identity::CallerIdentity;
use jobrbac::method::{
    PermsRemap,
    RemapTable,
};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{
    Layer,
    Service,
};

use crate::{
    error::Error,
    platform::Platform,
};

const GRPC_STATUS: HeaderName = HeaderName::from_static("grpc-status");
const GRPC_MESSAGE: HeaderName = HeaderName::from_static("grpc-message");

#[derive(Clone)]
pub struct PermsLayer {
    platform: Platform,
    remap: Option<Arc<RemapTable>>,
}

#[derive(Clone)]
pub struct PermsService<S> {
    inner: S,
    platform: Platform,
    remap: Option<Arc<RemapTable>>,
}

impl PermsLayer {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            remap: None,
        }
    }

    pub fn remap(mut self, val: RemapTable) -> Self {
        self.remap = Some(Arc::new(val));
        self
    }

    /// Uses the remap table provided by the handler, if any.
    pub fn remap_from(mut self, handler: &impl PermsRemap) -> Self {
        self.remap = handler.perms_remap()
            .cloned()
            .map(Arc::new);
        self
    }
}

impl<S> Layer<S> for PermsLayer {
    type Service = PermsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PermsService {
            inner,
            platform: self.platform.clone(),
            remap: self.remap.clone(),
        }
    }
}

/// The response returned in place of calling the handler.
pub fn deny_response<ResBody: Default>(error: &Error) -> Response<ResBody> {
    let mut response = Response::new(ResBody::default());
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
    headers.insert(GRPC_STATUS, HeaderValue::from(error.grpc_status()));
    headers.insert(GRPC_MESSAGE, HeaderValue::from_static(error.grpc_message()));
    response
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for PermsService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let platform = self.platform.clone();
        let remap = self.remap.clone();

        // only the inner service that was polled ready may be called
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                let method = req.uri().path().to_string();
                let identity = req.extensions().get::<CallerIdentity>().cloned();
                match platform.authorize(
                    identity.as_ref(),
                    &method,
                    remap.as_deref(),
                ).await {
                    Ok(()) => inner.call(req).await,
                    Err(e) => {
                        if matches!(e, Error::PermissionDenied) {
                            log::debug!("denied call to {method}");
                        } else {
                            log::warn!("failed to authorize call to {method}: {e}");
                        }
                        Ok(deny_response(&e))
                    }
                }
            }
        )
    }
}
