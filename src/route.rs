//! A route binds one compiled path pattern to one resource.
use crate::error::{Error, Result};
use crate::path::{Matcher, Params, PathPattern};
use crate::resource::{Handler, Resource, ResourceInfo};
use crate::router::RouterOptions;

use std::fmt;
use std::sync::Arc;

use hyper::Method;

pub struct Route<T = ()> {
    pattern: Arc<PathPattern>,
    matcher: Matcher,
    handlers: Vec<(Method, Box<dyn Handler<T>>)>,
    resource: Arc<ResourceInfo>,
}

impl<T> Route<T> {
    /// Compile `pattern` under `options` and bind it to `resource`.
    ///
    /// Fails if the pattern is malformed or the resource implements no
    /// recognized HTTP method.
    pub fn new(pattern: PathPattern, resource: Resource<T>, options: &RouterOptions) -> Result<Self> {
        if !resource.info().has_recognized_method() {
            return Err(Error::NoRecognizedMethod);
        }

        let matcher = Matcher::compile(&pattern, options)?;
        let (handlers, info) = resource.into_parts();

        Ok(Self {
            pattern: Arc::new(pattern),
            matcher,
            handlers,
            resource: Arc::new(info),
        })
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn resource(&self) -> &ResourceInfo {
        &self.resource
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Decoded parameters of `path`, or `None` if it does not match.
    pub fn params(&self, path: &str) -> Result<Option<Params>> {
        self.matcher.params(path)
    }

    pub fn handler_for(&self, method: &Method) -> Option<&dyn Handler<T>> {
        self.handlers
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handler)| handler.as_ref())
    }

    pub(crate) fn shared_pattern(&self) -> Arc<PathPattern> {
        Arc::clone(&self.pattern)
    }

    pub(crate) fn shared_resource(&self) -> Arc<ResourceInfo> {
        Arc::clone(&self.resource)
    }

    /// Returns true if `resource` was frozen from this route's resource.
    pub(crate) fn owns(&self, resource: &Arc<ResourceInfo>) -> bool {
        Arc::ptr_eq(&self.resource, resource)
    }
}

impl<T> fmt::Debug for Route<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("resource", &self.resource)
            .finish()
    }
}
