//! Resources: per-path tables of method handlers.
use crate::context::Context;
use crate::error::BoxError;

use std::fmt;

use futures_util::future::BoxFuture;
use hyper::http::Extensions;
use hyper::Method;

/// Method names the router recognizes when validating a resource.
const RECOGNIZED_METHODS: &[&str] = &[
    "ACL",
    "BIND",
    "CHECKOUT",
    "CONNECT",
    "COPY",
    "DELETE",
    "GET",
    "HEAD",
    "LINK",
    "LOCK",
    "M-SEARCH",
    "MERGE",
    "MKACTIVITY",
    "MKCALENDAR",
    "MKCOL",
    "MOVE",
    "NOTIFY",
    "OPTIONS",
    "PATCH",
    "POST",
    "PROPFIND",
    "PROPPATCH",
    "PURGE",
    "PUT",
    "REBIND",
    "REPORT",
    "SEARCH",
    "SOURCE",
    "SUBSCRIBE",
    "TRACE",
    "UNBIND",
    "UNLINK",
    "UNLOCK",
    "UNSUBSCRIBE",
];

/// Returns true if `method` is a standard or registered extension method.
pub fn is_recognized(method: &Method) -> bool {
    RECOGNIZED_METHODS.contains(&method.as_str())
}

/// Represents a resource method handler.
///
/// This trait is implemented for functions that borrow the request context
/// and return a boxed future resolving to the resource's value:
/// ```rust
/// # use resource_router::{BoxError, Context, Handler};
/// # use futures_util::future::BoxFuture;
/// fn hello(ctx: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
///     Box::pin(async move {
///         ctx.set_body("hello");
///         Ok(())
///     })
/// }
///
/// let handler: Box<dyn Handler> = Box::new(hello);
/// ```
///
/// Handlers are terminal: they receive no continuation and are expected to
/// write the response or return a value for the router's hooks.
pub trait Handler<T = ()>: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<T, BoxError>>;
}

impl<F, T> Handler<T> for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> {
        self(ctx)
    }
}

/// A mapping from HTTP method to handler, plus optional metadata.
///
/// ```rust
/// use resource_router::Resource;
///
/// struct Authenticate;
///
/// let widget: Resource = Resource::new()
///     .name("widget")
///     .with(Authenticate)
///     .get(|ctx| Box::pin(async move {
///         ctx.set_body("a widget");
///         Ok(())
///     }));
///
/// assert_eq!(widget.supported_methods().count(), 1);
/// ```
pub struct Resource<T = ()> {
    handlers: Vec<(Method, Box<dyn Handler<T>>)>,
    info: ResourceInfo,
}

impl<T: 'static> Resource<T> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            info: ResourceInfo::default(),
        }
    }

    /// Name the resource, for logs and introspection.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.info.name = Some(name.into());
        self
    }

    /// Attach typed metadata that middleware can read from the context.
    pub fn with<X: Send + Sync + 'static>(mut self, value: X) -> Self {
        self.info.extensions.insert(value);
        self
    }

    /// Register a handler for `method`.
    ///
    /// Registering the same method again replaces the handler but keeps its
    /// original position in the `Allow` list.
    pub fn method<F>(mut self, method: Method, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync + 'static,
    {
        let handler: Box<dyn Handler<T>> = Box::new(handler);
        match self.handlers.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => slot.1 = handler,
            None => {
                self.info.methods.push(method.clone());
                self.handlers.push((method, handler));
            }
        }
        self
    }

    /// Register a handler for `GET` requests
    pub fn get<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync + 'static,
    {
        self.method(Method::GET, handler)
    }

    /// Register a handler for `HEAD` requests
    pub fn head<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync + 'static,
    {
        self.method(Method::HEAD, handler)
    }

    /// Register a handler for `OPTIONS` requests
    pub fn options<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync + 'static,
    {
        self.method(Method::OPTIONS, handler)
    }

    /// Register a handler for `POST` requests
    pub fn post<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync + 'static,
    {
        self.method(Method::POST, handler)
    }

    /// Register a handler for `PUT` requests
    pub fn put<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync + 'static,
    {
        self.method(Method::PUT, handler)
    }

    /// Register a handler for `PATCH` requests
    pub fn patch<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync + 'static,
    {
        self.method(Method::PATCH, handler)
    }

    /// Register a handler for `DELETE` requests
    pub fn delete<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<T, BoxError>> + Send + Sync + 'static,
    {
        self.method(Method::DELETE, handler)
    }
}

impl<T> Resource<T> {
    /// The handler registered for `method`, if any.
    pub fn handler_for(&self, method: &Method) -> Option<&dyn Handler<T>> {
        self.handlers
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handler)| handler.as_ref())
    }

    /// Methods with a handler, in declaration order.
    pub fn supported_methods(&self) -> impl Iterator<Item = &Method> {
        self.info.methods.iter()
    }

    pub fn info(&self) -> &ResourceInfo {
        &self.info
    }

    pub(crate) fn into_parts(self) -> (Vec<(Method, Box<dyn Handler<T>>)>, ResourceInfo) {
        (self.handlers, self.info)
    }
}

impl<T: 'static> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource").field("info", &self.info).finish()
    }
}

/// What the context sees of the matched resource.
#[derive(Default)]
pub struct ResourceInfo {
    name: Option<String>,
    methods: Vec<Method>,
    extensions: Extensions,
}

impl ResourceInfo {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Methods the resource implements, in declaration order.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Recognized methods the resource implements, in declaration order.
    /// Extension methods the router does not recognize are left out.
    pub fn allowed_methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|method| is_recognized(method))
    }

    /// The value of the `Allow` header, e.g. `GET,POST`.
    pub fn allow(&self) -> String {
        self.allowed_methods()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Typed metadata attached with [`Resource::with`].
    pub fn get<X: Send + Sync + 'static>(&self) -> Option<&X> {
        self.extensions.get::<X>()
    }

    pub(crate) fn has_recognized_method(&self) -> bool {
        self.methods.iter().any(is_recognized)
    }
}

impl fmt::Debug for ResourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceInfo")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .finish()
    }
}
