//! [`Router`](crate::Router) dispatches requests to resources via an ordered
//! list of routes.
//!
//! Routes are tried in registration order and the first whose pattern matches
//! the request path wins. The matched resource's handler for the request
//! method runs after every registered middleware. Requests the resource has no
//! handler for go to one of three fallbacks:
//! ```ignore
//!  Method    Fallback            Default behaviour
//!  HEAD      HEAD                re-dispatch as GET, or 405 without GET
//!  OPTIONS   OPTIONS             200 with an `Allow` header
//!  other     methodNotAllowed    405 with an `Allow` header
//! ```
//!
//! Middleware never runs for fallbacks or unmatched requests.
//!
//! The router is meant to sit inside a larger request pipeline: unmatched
//! requests are handed to the host's continuation. Without one, the router
//! answers `404 Not Found` itself, which is what [`Router::serve`] relies on:
//!
//! ```rust,no_run
//! use resource_router::{BoxError, Context, Resource, Router};
//! use futures_util::future::BoxFuture;
//!
//! fn hello(ctx: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
//!     Box::pin(async move {
//!         let name = ctx.params().get("user").unwrap_or("world").to_owned();
//!         ctx.set_body(format!("Hello, {}", name));
//!         Ok(())
//!     })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let router: Router = Router::new()
//!         .route("/hello/:user", Resource::new().get(hello))?;
//!
//!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!         .serve(router.into_service())
//!         .await?;
//!     Ok(())
//! }
//! ```
use crate::context::Context;
use crate::error::{BoxError, Error, Result};
use crate::path::{Params, PathPattern};
use crate::resource::{Handler, Resource, ResourceInfo};
use crate::route::Route;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures_util::future::{self, BoxFuture};
use hyper::header::{self, HeaderValue};
use hyper::service::Service;
use hyper::{Body, Method, Request, Response, StatusCode};
use tracing::{debug, error, trace, warn};

/// Matching options, fixed when the router is created and applied to every
/// route it compiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterOptions {
    /// Require the trailing slash of the request path to match the pattern
    /// exactly. When disabled a single trailing slash is ignored.
    pub strict: bool,
    /// Compare literal segments case-sensitively.
    pub case_sensitive: bool,
}

impl RouterOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// The host's continuation for requests no route matches.
pub type Next<'a> =
    &'a (dyn for<'c> Fn(&'c mut Context) -> BoxFuture<'c, std::result::Result<(), BoxError>> + Send + Sync);

/// How a dispatched request was answered.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// No route matched. The continuation ran, or the router answered 404.
    Unmatched,
    /// A fallback handler produced the response.
    Fallback,
    /// The resource resolved and `resource_ok` returned this value.
    Resolved(T),
    /// An error hook produced the response.
    Handled,
}

/// The decision of an error hook.
#[derive(Debug)]
pub enum ErrorAction {
    /// The hook wrote a response; stop processing.
    Handled,
    /// Hand the error to the host.
    Propagate(BoxError),
}

/// The fallback slots that can be overridden with [`Router::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackKind {
    MethodNotAllowed,
    Options,
    Head,
}

impl FromStr for FallbackKind {
    type Err = Error;

    fn from_str(kind: &str) -> Result<Self> {
        match kind {
            "methodNotAllowed" => Ok(FallbackKind::MethodNotAllowed),
            "OPTIONS" => Ok(FallbackKind::Options),
            "HEAD" => Ok(FallbackKind::Head),
            _ => Err(Error::UnknownFallback(kind.to_owned())),
        }
    }
}

impl fmt::Display for FallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackKind::MethodNotAllowed => "methodNotAllowed",
            FallbackKind::Options => "OPTIONS",
            FallbackKind::Head => "HEAD",
        })
    }
}

/// Represents a fallback handler.
///
/// Fallbacks receive the host continuation and the router itself so they can
/// re-dispatch, as the default `HEAD` handler does.
pub trait Fallback<T>: Send + Sync {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Option<Next<'a>>,
        router: &'a Router<T>,
    ) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>>;
}

impl<F, T> Fallback<T> for F
where
    F: for<'a> Fn(&'a mut Context, Option<Next<'a>>, &'a Router<T>) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>>
        + Send
        + Sync,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Option<Next<'a>>,
        router: &'a Router<T>,
    ) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>> {
        self(ctx, next, router)
    }
}

/// Represents a middleware function.
///
/// Middleware runs for every matched request that has a handler, in
/// registration order. It gets no continuation: the only way to stop the
/// pipeline is to fail.
pub trait Middleware: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, std::result::Result<(), BoxError>>;
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, std::result::Result<(), BoxError>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, std::result::Result<(), BoxError>> {
        self(ctx)
    }
}

/// A collection resource and, optionally, the resource of its members.
pub struct Collection<T = ()> {
    pub collection: Option<Resource<T>>,
    pub member: Option<Resource<T>>,
}

impl<T> Collection<T> {
    pub fn new(collection: Resource<T>) -> Self {
        Self {
            collection: Some(collection),
            member: None,
        }
    }

    pub fn member(mut self, member: Resource<T>) -> Self {
        self.member = Some(member);
        self
    }
}

struct Fallbacks<T> {
    method_not_allowed: Box<dyn Fallback<T>>,
    options: Box<dyn Fallback<T>>,
    head: Box<dyn Fallback<T>>,
}

type OkHook<T> = Box<dyn Fn(&mut Context, T) -> std::result::Result<T, BoxError> + Send + Sync>;
type ErrHook = Box<dyn Fn(&mut Context, BoxError) -> ErrorAction + Send + Sync>;

/// Router dispatches requests to resources via configurable routes.
///
/// `T` is the value resource handlers resolve to; it is passed through the
/// `resource_ok` hook and returned from [`Router::dispatch`].
pub struct Router<T = ()> {
    routes: Vec<Route<T>>,
    middleware: Vec<Box<dyn Middleware>>,
    fallbacks: Fallbacks<T>,
    resource_ok: OkHook<T>,
    resource_err: ErrHook,
    middleware_err: ErrHook,
    options: RouterOptions,
}

impl<T: Send + 'static> Router<T> {
    /// A router that ignores case and a trailing slash.
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            routes: Vec::new(),
            middleware: Vec::new(),
            fallbacks: Fallbacks {
                method_not_allowed: Box::new(method_not_allowed::<T>),
                options: Box::new(options_allowed::<T>),
                head: Box::new(head_as_get::<T>),
            },
            resource_ok: Box::new(resolve_value::<T>),
            resource_err: Box::new(propagate),
            middleware_err: Box::new(propagate),
            options,
        }
    }

    /// Register `resource` at `path`.
    ///
    /// Routes are matched in the order they are registered. Registering the
    /// same path twice adds a second route that is never reached.
    /// ```rust
    /// use resource_router::{Resource, Router};
    /// use hyper::StatusCode;
    ///
    /// let router: Router = Router::new()
    ///     .route("/teapot", Resource::new().get(|ctx| Box::pin(async move {
    ///         ctx.set_status(StatusCode::IM_A_TEAPOT);
    ///         Ok(())
    ///     })))
    ///     .unwrap();
    ///
    /// assert_eq!(router.routes().len(), 1);
    /// ```
    pub fn route(mut self, path: impl Into<PathPattern>, resource: Resource<T>) -> Result<Self> {
        let route = Route::new(path.into(), resource, &self.options)?;
        debug!(
            pattern = %route.pattern(),
            methods = %route.resource().allow(),
            "route registered"
        );
        self.routes.push(route);
        Ok(self)
    }

    /// Register a collection at the parent of `path` and, if present, its
    /// member resource at `path` itself.
    ///
    /// `collection("/widgets/:id", ..)` mounts the collection at `/widgets`
    /// and the member at `/widgets/:id`.
    pub fn collection(self, path: impl Into<PathPattern>, pair: Collection<T>) -> Result<Self> {
        let path = path.into();
        let Collection { collection, member } = pair;

        let collection = collection.ok_or_else(|| Error::MissingCollection(path.to_string()))?;
        let parent = path.parent()?;

        let router = match member {
            Some(member) => self.route(path, member)?,
            None => self,
        };

        router.route(parent, collection)
    }

    /// Append a middleware function to the pipeline.
    pub fn middleware<F>(mut self, middleware: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, std::result::Result<(), BoxError>> + Send + Sync + 'static,
    {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Replace one of the fallback handlers.
    /// ```rust
    /// use resource_router::{FallbackKind, Outcome, Router};
    /// use hyper::StatusCode;
    ///
    /// let router: Router = Router::new()
    ///     .handle("methodNotAllowed".parse().unwrap(), |ctx, _, _| Box::pin(async move {
    ///         ctx.set_status(StatusCode::METHOD_NOT_ALLOWED);
    ///         ctx.set_body("No way, pal!");
    ///         Ok(Outcome::Fallback)
    ///     }));
    /// # let _ = FallbackKind::Head;
    /// ```
    pub fn handle<F>(mut self, kind: FallbackKind, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context, Option<Next<'a>>, &'a Router<T>) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        let handler: Box<dyn Fallback<T>> = Box::new(handler);
        match kind {
            FallbackKind::MethodNotAllowed => self.fallbacks.method_not_allowed = handler,
            FallbackKind::Options => self.fallbacks.options = handler,
            FallbackKind::Head => self.fallbacks.head = handler,
        }
        self
    }

    /// The currently configured fallback of the given kind.
    pub fn fallback(&self, kind: FallbackKind) -> &dyn Fallback<T> {
        match kind {
            FallbackKind::MethodNotAllowed => self.fallbacks.method_not_allowed.as_ref(),
            FallbackKind::Options => self.fallbacks.options.as_ref(),
            FallbackKind::Head => self.fallbacks.head.as_ref(),
        }
    }

    /// Run a registration plugin, for grouping several calls on the router.
    pub fn apply<F>(self, plugin: F) -> Result<Self>
    where
        F: FnOnce(Self) -> Result<Self>,
    {
        plugin(self)
    }

    /// Post-process the value a resource resolved to. The returned value
    /// becomes the dispatch outcome. Defaults to returning it unchanged.
    pub fn resource_ok<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, T) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.resource_ok = Box::new(hook);
        self
    }

    /// Handle an error raised by a resource. Defaults to propagating it.
    pub fn resource_err<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, BoxError) -> ErrorAction + Send + Sync + 'static,
    {
        self.resource_err = Box::new(hook);
        self
    }

    /// Handle an error raised by a middleware. Defaults to propagating it.
    /// The resource handler is never invoked after a middleware error.
    pub fn middleware_err<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, BoxError) -> ErrorAction + Send + Sync + 'static,
    {
        self.middleware_err = Box::new(hook);
        self
    }

    pub fn options(&self) -> RouterOptions {
        self.options
    }

    /// Registered routes, in match order.
    pub fn routes(&self) -> &[Route<T>] {
        &self.routes
    }

    /// Lookup allows the manual lookup of the route for a path, along with
    /// its decoded parameters.
    /// ```rust
    /// use resource_router::{Resource, Router};
    ///
    /// let router: Router = Router::new()
    ///     .route("/home/:room", Resource::new().get(|_| Box::pin(async { Ok(()) })))
    ///     .unwrap();
    ///
    /// let (route, params) = router.lookup("/home/kitchen").unwrap().unwrap();
    /// assert_eq!(route.pattern().to_string(), "/home/:room");
    /// assert_eq!(params.get("room"), Some("kitchen"));
    /// ```
    pub fn lookup(&self, path: &str) -> Result<Option<(&Route<T>, Params)>> {
        match self.find(path) {
            Some((_, route)) => Ok(route.params(path)?.map(|params| (route, params))),
            None => Ok(None),
        }
    }

    /// Returns a list of the allowed methods for a specific path, in the
    /// order the matching resource declared them.
    pub fn allowed(&self, path: &str) -> Vec<&str> {
        self.find(path)
            .map(|(_, route)| route.resource().allowed_methods().map(Method::as_str).collect())
            .unwrap_or_default()
    }

    fn find(&self, path: &str) -> Option<(usize, &Route<T>)> {
        self.routes
            .iter()
            .enumerate()
            .find(|(_, route)| route.is_match(path))
    }

    /// Dispatch a request.
    ///
    /// If no route matches, `next` is invoked; without a continuation the
    /// router answers `404 Not Found`. Errors that no hook handles are
    /// returned unchanged.
    pub fn dispatch<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Option<Next<'a>>,
    ) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>> {
        Box::pin(self.dispatch_path(ctx, next))
    }

    async fn dispatch_path(
        &self,
        ctx: &mut Context,
        next: Option<Next<'_>>,
    ) -> std::result::Result<Outcome<T>, BoxError> {
        let path = ctx.path().to_owned();

        let (index, route) = match self.find(&path) {
            Some(found) => found,
            None => {
                trace!(path = %path, "no route matched");
                match next {
                    Some(next) => next(ctx).await?,
                    None => {
                        ctx.set_status(StatusCode::NOT_FOUND);
                        ctx.set_body("Not Found");
                    }
                }
                return Ok(Outcome::Unmatched);
            }
        };

        let params = match route.params(&path) {
            Ok(params) => params.unwrap_or_default(),
            Err(err) => {
                warn!(path = %path, error = %err, "failed to decode path parameters");
                return Err(err.into());
            }
        };

        debug!(
            method = %ctx.method(),
            path = %path,
            pattern = %route.pattern(),
            "route matched"
        );
        ctx.set_match(index, route.shared_pattern(), route.shared_resource(), params);

        self.resolve(ctx, next).await
    }

    /// Resolve the effective method of an already matched request against
    /// its resource.
    ///
    /// This re-enters dispatch after route lookup, so a fallback can rewrite
    /// the method and try again. A context that has not been matched by this
    /// router is dispatched from the start.
    pub fn resolve<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Option<Next<'a>>,
    ) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>> {
        let route = ctx
            .matched()
            .and_then(|index| self.routes.get(index))
            .filter(|route| ctx.matched_resource().map_or(false, |resource| route.owns(resource)));

        let route = match route {
            Some(route) => route,
            None => return self.dispatch(ctx, next),
        };

        let method = ctx.method().clone();
        if let Some(handler) = route.handler_for(&method) {
            return Box::pin(self.invoke(handler, ctx));
        }

        let kind = match method {
            Method::HEAD => FallbackKind::Head,
            Method::OPTIONS => FallbackKind::Options,
            _ => FallbackKind::MethodNotAllowed,
        };
        debug!(method = %method, path = %ctx.path(), fallback = %kind, "no handler for method");
        self.fallback(kind).call(ctx, next, self)
    }

    async fn invoke(
        &self,
        handler: &dyn Handler<T>,
        ctx: &mut Context,
    ) -> std::result::Result<Outcome<T>, BoxError> {
        for middleware in &self.middleware {
            if let Err(err) = middleware.call(ctx).await {
                return match (self.middleware_err)(ctx, err) {
                    ErrorAction::Handled => Ok(Outcome::Handled),
                    ErrorAction::Propagate(err) => Err(err),
                };
            }
        }

        match handler.call(ctx).await {
            Ok(value) => (self.resource_ok)(ctx, value).map(Outcome::Resolved),
            Err(err) => match (self.resource_err)(ctx, err) {
                ErrorAction::Handled => Ok(Outcome::Handled),
                ErrorAction::Propagate(err) => Err(err),
            },
        }
    }

    /// Serve a request without a host pipeline.
    ///
    /// Unmatched requests get a 404, `HEAD` responses lose their body, and
    /// errors no hook handles become a plain-text response with the error's
    /// status (400 for undecodable parameters, 500 otherwise).
    pub async fn serve(&self, req: Request<Body>) -> std::result::Result<Response<Body>, Infallible> {
        let mut ctx = Context::new(req);
        let head = *ctx.method() == Method::HEAD;

        let mut response = match self.dispatch(&mut ctx, None).await {
            Ok(_) => ctx.into_response(),
            Err(err) => error_response(err),
        };

        if head {
            *response.body_mut() = Body::empty();
        }

        Ok(response)
    }

    /// Converts the `Router` into a `Service` which you can serve directly with `Hyper`.
    /// If you have an existing `Service` that you want to incorporate a `Router` into, see
    /// [`Router::serve`](crate::Router::serve) and [`Router::dispatch`].
    pub fn into_service(self) -> MakeRouterService<T> {
        MakeRouterService(RouterService(Arc::new(self)))
    }
}

impl<T: Send + 'static> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("middleware", &self.middleware.len())
            .field("options", &self.options)
            .finish()
    }
}

fn error_response(err: BoxError) -> Response<Body> {
    let status = err
        .downcast_ref::<Error>()
        .map_or(StatusCode::INTERNAL_SERVER_ERROR, Error::status);

    let body = if status.is_server_error() {
        error!(error = %err, "unhandled error while dispatching");
        status.canonical_reason().unwrap_or_default().to_owned()
    } else {
        debug!(error = %err, status = %status, "request rejected");
        err.to_string()
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
}

fn allow_response(ctx: &mut Context, status: StatusCode) -> std::result::Result<String, BoxError> {
    let allow = ctx.resource().map(ResourceInfo::allow).unwrap_or_default();
    ctx.set_header(header::ALLOW, HeaderValue::from_str(&allow).map_err(Error::from)?);
    ctx.set_status(status);
    Ok(allow)
}

fn method_not_allowed<'a, T: Send + 'static>(
    ctx: &'a mut Context,
    _: Option<Next<'a>>,
    _: &'a Router<T>,
) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>> {
    let result = allow_response(ctx, StatusCode::METHOD_NOT_ALLOWED).map(|_| {
        ctx.set_body("Method Not Allowed");
        Outcome::Fallback
    });
    Box::pin(future::ready(result))
}

fn options_allowed<'a, T: Send + 'static>(
    ctx: &'a mut Context,
    _: Option<Next<'a>>,
    _: &'a Router<T>,
) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>> {
    let result = allow_response(ctx, StatusCode::OK).map(|allow| {
        ctx.set_body(format!("Allow: {}", allow));
        Outcome::Fallback
    });
    Box::pin(future::ready(result))
}

// the host strips the body; see `Router::serve`
fn head_as_get<'a, T: Send + 'static>(
    ctx: &'a mut Context,
    next: Option<Next<'a>>,
    router: &'a Router<T>,
) -> BoxFuture<'a, std::result::Result<Outcome<T>, BoxError>> {
    if !ctx.resource().map_or(false, |resource| resource.allows(&Method::GET)) {
        return router
            .fallback(FallbackKind::MethodNotAllowed)
            .call(ctx, next, router);
    }

    ctx.set_method(Method::GET);
    router.resolve(ctx, next)
}

fn resolve_value<T>(_: &mut Context, value: T) -> std::result::Result<T, BoxError> {
    Ok(value)
}

fn propagate(_: &mut Context, err: BoxError) -> ErrorAction {
    ErrorAction::Propagate(err)
}

#[doc(hidden)]
pub struct MakeRouterService<T>(RouterService<T>);

impl<T, Target> Service<Target> for MakeRouterService<T> {
    type Response = RouterService<T>;
    type Error = Infallible;
    type Future = future::Ready<std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: Target) -> Self::Future {
        future::ok(self.0.clone())
    }
}

#[doc(hidden)]
pub struct RouterService<T>(Arc<Router<T>>);

impl<T> Clone for RouterService<T> {
    fn clone(&self) -> Self {
        RouterService(Arc::clone(&self.0))
    }
}

impl<T: Send + 'static> Service<Request<Body>> for RouterService<T> {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, std::result::Result<Response<Body>, Infallible>>;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let router = Arc::clone(&self.0);
        Box::pin(async move { router.serve(req).await })
    }
}
