//! # Resource Router
//!
//! A resource-oriented HTTP request router for [hyper](https://hyper.rs).
//!
//! Routes bind a path pattern to a *resource*, a table of handlers keyed by
//! HTTP method. Requests are matched against the routes in the order they were
//! registered, and the first match wins. A pipeline of middleware runs before
//! every resource handler, and the resource's value is passed through
//! configurable hooks before it is handed back to the host.
//!
//! ## Features
//!
//! **Ordered matching:** Routes are tried in registration order. There are no
//! priority rules to learn: register the more specific pattern first.
//!
//! **Parameters in your routing pattern:** Give a path segment a name and the
//! router delivers the percent-decoded value to you. Parameters can be
//! optional, and a catch-all parameter captures the rest of the path.
//!
//! **Method fallbacks:** A resource that lacks a handler for the request
//! method gets an automatic `405 Method Not Allowed`, `OPTIONS` requests are
//! answered with an `Allow` header, and `HEAD` requests are served by the
//! `GET` handler. Each fallback can be replaced.
//!
//! **A shared middleware pipeline:** Middleware sees the matched resource and
//! its metadata before the handler does, so checks like authentication can be
//! declared on the resource and enforced in one place.
//!
//! ## Usage
//!
//! Here is a simple example:
//!
//! ```rust,no_run
//! use resource_router::{BoxError, Context, Resource, Router};
//! use futures_util::future::BoxFuture;
//!
//! fn index(ctx: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
//!     Box::pin(async move {
//!         ctx.set_body("Hello, World!");
//!         Ok(())
//!     })
//! }
//!
//! fn hello(ctx: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
//!     Box::pin(async move {
//!         let greeting = format!("Hello, {}", ctx.params().get("user").unwrap_or("world"));
//!         ctx.set_body(greeting);
//!         Ok(())
//!     })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let router: Router = Router::new()
//!         .route("/", Resource::new().get(index))?
//!         .route("/hello/:user", Resource::new().get(hello))?;
//!
//!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!         .serve(router.into_service())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Named parameters
//!
//! As you can see, `:user` is a *named parameter*. The values are accessible
//! via [`Context::params`].
//!
//! Named parameters only match a single path segment:
//!
//! ```ignore
//! Pattern: /user/:user
//!
//!  /user/gordon              match
//!  /user/you                 match
//!  /user/gordon/profile      no match
//!  /user/                    no match
//! ```
//!
//! A trailing `?` makes a parameter optional:
//!
//! ```ignore
//! Pattern: /user/:user?
//!
//!  /user                     match, no `user` parameter
//!  /user/gordon              match
//! ```
//!
//! ### Catch-All parameters
//!
//! The other type are *catch-all* parameters and have the form `*name`. Like
//! the name suggests, they match everything. Therefore they must always be at
//! the **end** of the pattern:
//!
//! ```ignore
//! Pattern: /src/*filepath
//!
//!  /src/somefile.rs          match
//!  /src/subdir/somefile.rs   match
//! ```
//!
//! Patterns are case-insensitive and ignore a trailing slash unless the router
//! is built with [`RouterOptions`] saying otherwise. A [`regex::Regex`] can be
//! registered where the grammar is not enough.
//!
//! ## Method fallbacks
//!
//! The default fallbacks can be swapped out with [`Router::handle`]:
//!
//! ```rust
//! use resource_router::{FallbackKind, Outcome, Resource, Router};
//! use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_METHODS};
//! use hyper::StatusCode;
//!
//! let router: Router = Router::new()
//!     .handle(FallbackKind::Options, |ctx, _, _| Box::pin(async move {
//!         let allow = ctx.resource().map(|r| r.allow()).unwrap_or_default();
//!         ctx.set_status(StatusCode::NO_CONTENT);
//!         if let Ok(value) = HeaderValue::from_str(&allow) {
//!             ctx.set_header(ACCESS_CONTROL_ALLOW_METHODS, value);
//!         }
//!         Ok(Outcome::Fallback)
//!     }))
//!     .route("/widgets", Resource::new().get(|_| Box::pin(async { Ok(()) })))
//!     .unwrap();
//! ```
//!
//! ## Middleware
//!
//! Middleware runs in registration order for every request that reached a
//! resource handler. It can read the matched resource and any metadata
//! attached to it with [`Resource::with`]. Failing stops the pipeline and hands
//! the error to the `middleware_err` hook:
//!
//! ```rust
//! use resource_router::{BoxError, Context, Resource, Router};
//! use futures_util::future::BoxFuture;
//!
//! struct Public;
//!
//! fn authenticate(ctx: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
//!     Box::pin(async move {
//!         let public = ctx.resource().map_or(false, |r| r.get::<Public>().is_some());
//!         if public || ctx.request().headers().contains_key("authorization") {
//!             Ok(())
//!         } else {
//!             Err(BoxError::from("unauthenticated"))
//!         }
//!     })
//! }
//!
//! let router: Router = Router::new()
//!     .middleware(authenticate)
//!     .route("/login", Resource::new().with(Public).post(|_| Box::pin(async { Ok(()) })))
//!     .unwrap();
//! ```
//!
//! ## Collections
//!
//! [`Router::collection`] mounts a collection resource at the parent of a
//! path and its member resource at the path itself:
//!
//! ```rust
//! use resource_router::{Collection, Resource, Router};
//!
//! let router: Router = Router::new()
//!     .collection(
//!         "/widgets/:id",
//!         Collection::new(Resource::new().get(|_| Box::pin(async { Ok(()) })))
//!             .member(Resource::new().get(|_| Box::pin(async { Ok(()) }))),
//!     )
//!     .unwrap();
//!
//! assert_eq!(router.allowed("/widgets"), ["GET"]);
//! assert_eq!(router.allowed("/widgets/7"), ["GET"]);
//! ```
//!
//! ## Hooks
//!
//! Resources resolve to a value of the router's type parameter. The
//! `resource_ok`, `resource_err` and `middleware_err` hooks decide what that
//! value, or an error, means for the response. The [`respond`] module installs
//! hooks that treat a [`Reply`](respond::Reply) as the response itself.

#![forbid(unsafe_code)]

mod context;
mod error;
mod path;
mod resource;
mod route;

pub mod respond;

#[doc(hidden)]
pub mod router;

#[doc(inline)]
pub use context::Context;

#[doc(inline)]
pub use error::{BoxError, Error, Result};

#[doc(inline)]
pub use path::{decode_param, Matcher, Param, Params, PathPattern, Segment};

#[doc(inline)]
pub use resource::{is_recognized, Handler, Resource, ResourceInfo};

#[doc(inline)]
pub use route::Route;

#[doc(inline)]
pub use router::{
    Collection, ErrorAction, Fallback, FallbackKind, Middleware, Next, Outcome, Router, RouterOptions,
};
