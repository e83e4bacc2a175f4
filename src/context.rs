//! Request-scoped state passed through middleware, handlers and fallbacks.
use crate::path::{Params, PathPattern};
use crate::resource::ResourceInfo;

use std::sync::Arc;

use hyper::header::{HeaderName, HeaderValue};
use hyper::http::Extensions;
use hyper::{Body, HeaderMap, Method, Request, Response, StatusCode};

/// Per-request state.
///
/// Wraps the incoming request and collects the response the router, its
/// middleware and the resource write. The router fills in [`route`],
/// [`resource`] and [`params`] once a route matches.
///
/// [`route`]: Context::route
/// [`resource`]: Context::resource
/// [`params`]: Context::params
#[derive(Debug)]
pub struct Context {
    request: Request<Body>,
    method: Method,
    path: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    extensions: Extensions,
    params: Params,
    route: Option<Arc<PathPattern>>,
    resource: Option<Arc<ResourceInfo>>,
    matched: Option<usize>,
}

impl Context {
    /// Capture `request`. The effective method is the request method in
    /// upper case; the response starts out as an empty `200 OK`.
    pub fn new(request: Request<Body>) -> Self {
        let method = uppercase(request.method());
        let path = request.uri().path().to_owned();

        Self {
            request,
            method,
            path,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Body::empty(),
            extensions: Extensions::new(),
            params: Params::default(),
            route: None,
            resource: None,
            matched: None,
        }
    }

    /// The original request. Its method is never rewritten.
    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    /// The effective request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Rewrite the effective method, e.g. to serve `HEAD` as `GET`.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Set a response header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Typed state shared between middleware and handlers for this request.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Decoded parameters of the matched route, empty before a match.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The pattern of the matched route.
    pub fn route(&self) -> Option<&PathPattern> {
        self.route.as_deref()
    }

    /// The matched resource.
    pub fn resource(&self) -> Option<&ResourceInfo> {
        self.resource.as_deref()
    }

    pub(crate) fn set_match(
        &mut self,
        index: usize,
        route: Arc<PathPattern>,
        resource: Arc<ResourceInfo>,
        params: Params,
    ) {
        self.matched = Some(index);
        self.route = Some(route);
        self.resource = Some(resource);
        self.params = params;
    }

    pub(crate) fn matched(&self) -> Option<usize> {
        self.matched
    }

    pub(crate) fn matched_resource(&self) -> Option<&Arc<ResourceInfo>> {
        self.resource.as_ref()
    }

    /// Assemble the response written so far.
    pub fn into_response(self) -> Response<Body> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

fn uppercase(method: &Method) -> Method {
    let name = method.as_str();
    if !name.bytes().any(|b| b.is_ascii_lowercase()) {
        return method.clone();
    }

    Method::from_bytes(name.to_ascii_uppercase().as_bytes()).unwrap_or_else(|_| method.clone())
}
