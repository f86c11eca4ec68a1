//! Client-side Identity Propagation
//!
//! Attaches the caller identity to outgoing gRPC requests via metadata.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tower::{BoxError, Layer, Service};
use tracing::{debug, warn};

use crate::codec::{encode, IDENTITY_METADATA_KEY};
use crate::context::IdentityExt;
use crate::error::IdentityError;
use crate::identity::Identity;

/// Encode the identity to send, preferring the one attached to the request
fn outgoing_value(
    attached: Option<&Identity>,
    fallback: Option<&Identity>,
) -> Result<Option<AsciiMetadataValue>, IdentityError> {
    let Some(identity) = attached.or(fallback) else {
        return Ok(None);
    };

    let value = encode(identity).map_err(|e| {
        warn!(user_id = %identity.id, "Failed to encode outgoing identity: {}", e);
        e
    })?;

    debug!(user_id = %identity.id, "Attaching identity to outgoing request");
    Ok(Some(value))
}

/// Client-side interceptor that forwards the caller identity in gRPC metadata
///
/// The identity is read from the request extensions (see `IdentityExt`). When
/// none is attached, the request is sent exactly as if the interceptor were
/// not installed. tonic runs client interceptors for unary and streaming
/// calls alike.
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_identity_propagation::IdentityClientInterceptor;
/// use tonic::transport::Channel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let channel = Channel::from_static("http://[::1]:50051")
///     .connect()
///     .await?;
///
/// // let mut client = UserServiceClient::with_interceptor(channel, IdentityClientInterceptor::new());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct IdentityClientInterceptor {
    /// Identity sent when the request carries none
    fallback: Option<Identity>,
}

impl IdentityClientInterceptor {
    /// Forward whatever identity each request carries
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward `identity` for requests that carry none of their own
    ///
    /// Useful for service-to-service clients acting under a fixed identity.
    pub fn for_identity(identity: Identity) -> Self {
        Self {
            fallback: Some(identity),
        }
    }

    /// Attach the identity to a request's metadata
    ///
    /// ## Errors
    ///
    /// Returns the encode error unchanged; nothing is attached in that case.
    pub fn attach<T>(&self, request: &mut Request<T>) -> Result<(), IdentityError> {
        let value = outgoing_value(request.identity(), self.fallback.as_ref())?;
        if let Some(value) = value {
            request.metadata_mut().insert(IDENTITY_METADATA_KEY, value);
        }
        Ok(())
    }
}

impl Interceptor for IdentityClientInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        self.attach(&mut request)?;
        Ok(request)
    }
}

/// Tower layer attaching the caller identity to every request on a channel
///
/// ```rust,no_run
/// use grpc_identity_propagation::IdentityPropagationLayer;
/// use tonic::transport::Channel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let channel = Channel::from_static("http://[::1]:50051").connect().await?;
/// let channel = tower::ServiceBuilder::new()
///     .layer(IdentityPropagationLayer::new())
///     .service(channel);
/// // let mut client = UserServiceClient::new(channel);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct IdentityPropagationLayer {
    fallback: Option<Identity>,
}

impl IdentityPropagationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_identity(identity: Identity) -> Self {
        Self {
            fallback: Some(identity),
        }
    }
}

impl<S> Layer<S> for IdentityPropagationLayer {
    type Service = IdentityPropagationService<S>;

    fn layer(&self, service: S) -> Self::Service {
        IdentityPropagationService {
            inner: service,
            fallback: self.fallback.clone(),
        }
    }
}

/// Tower service attaching the caller identity to outgoing HTTP/2 requests
#[derive(Clone, Debug)]
pub struct IdentityPropagationService<S> {
    inner: S,
    fallback: Option<Identity>,
}

impl<S, B> Service<http::Request<B>> for IdentityPropagationService<S>
where
    S: Service<http::Request<B>>,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        let outgoing = outgoing_value(req.identity(), self.fallback.as_ref());
        match outgoing {
            Ok(Some(value)) => {
                let mut metadata = MetadataMap::from_headers(std::mem::take(req.headers_mut()));
                metadata.insert(IDENTITY_METADATA_KEY, value);
                *req.headers_mut() = metadata.into_headers();
            }
            Ok(None) => {}
            Err(e) => {
                // Abort before the inner service sees the call
                let status = e.to_status();
                return Box::pin(async move { Err(Box::new(status) as BoxError) });
            }
        }

        let fut = self.inner.call(req);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}
