//! Responses as values.
//!
//! A [`Reply`] can be returned from a resource or raised as an error from a
//! resource or middleware. Installing [`respond`] on a `Router<Reply>` writes
//! either onto the context:
//!
//! ```rust
//! use resource_router::respond::{respond, Reply};
//! use resource_router::{BoxError, Resource, Router};
//! use hyper::StatusCode;
//!
//! let router: Router<Reply> = Router::new()
//!     .apply(respond)
//!     .unwrap()
//!     .route("/widget/:id", Resource::new().get(|ctx| Box::pin(async move {
//!         match ctx.params().get("id") {
//!             Some("1") => Ok(Reply::new(StatusCode::OK).with_body("widget 1")),
//!             _ => Err(BoxError::from(Reply::new(StatusCode::NOT_FOUND))),
//!         }
//!     })))
//!     .unwrap();
//! ```
use crate::context::Context;
use crate::error::{BoxError, Result};
use crate::router::{ErrorAction, Router};

use std::error::Error as StdError;
use std::fmt;

use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};

/// A status, headers and body to write onto the response.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Reply {
    /// An empty reply with `status`.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Write the reply onto `ctx`. Headers it carries replace any the
    /// context already has under the same name.
    pub fn apply(&self, ctx: &mut Context) {
        ctx.set_status(self.status);
        for name in self.headers.keys() {
            ctx.headers_mut().remove(name);
            for value in self.headers.get_all(name) {
                ctx.headers_mut().append(name.clone(), value.clone());
            }
        }
        ctx.set_body(self.body.clone());
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reply with status {}", self.status)
    }
}

impl StdError for Reply {}

/// Install hooks that write returned and raised [`Reply`] values.
///
/// Errors that are not replies propagate unchanged.
pub fn respond(router: Router<Reply>) -> Result<Router<Reply>> {
    Ok(router
        .resource_ok(|ctx, reply| {
            reply.apply(ctx);
            Ok(reply)
        })
        .resource_err(apply_raised)
        .middleware_err(apply_raised))
}

fn apply_raised(ctx: &mut Context, err: BoxError) -> ErrorAction {
    match err.downcast::<Reply>() {
        Ok(reply) => {
            reply.apply(ctx);
            ErrorAction::Handled
        }
        Err(err) => ErrorAction::Propagate(err),
    }
}
