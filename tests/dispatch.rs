use futures_util::future::BoxFuture;
use hyper::header::{self, HeaderMap};
use hyper::{Body, Method, Request, StatusCode};
use regex::Regex;
use resource_router::{
    BoxError, Collection, Context, Error, ErrorAction, FallbackKind, Next, Outcome, Resource, Router,
    RouterOptions,
};

fn worked(ctx: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
    Box::pin(async move {
        ctx.set_status(StatusCode::OK);
        ctx.set_body("success");
        Ok(())
    })
}

fn failed(ctx: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
    Box::pin(async move {
        ctx.set_status(StatusCode::OK);
        ctx.set_body("failed");
        Ok(())
    })
}

fn bad_request(_: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
    Box::pin(async { Err(BoxError::from("Bad Request")) })
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send<T: Send + 'static>(router: &Router<T>, method: &str, uri: &str) -> (StatusCode, HeaderMap, String) {
    let response = router.serve(request(method, uri)).await.unwrap();
    let (parts, body) = response.into_parts();
    let body = hyper::body::to_bytes(body).await.unwrap();
    (parts.status, parts.headers, String::from_utf8(body.to_vec()).unwrap())
}

#[test]
fn route_rejects_invalid_paths() {
    let err = Router::new().route("test", Resource::new().get(worked)).unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
    assert!(err.to_string().starts_with("invalid path"));
}

#[test]
fn route_rejects_empty_segments() {
    for path in ["/a//b", "//", "/users/:id//"] {
        let err = Router::<()>::new().route(path, Resource::new().get(worked)).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)), "{}", path);
    }
    assert!(Router::<()>::new().route("/", Resource::new().get(worked)).is_ok());
    assert!(Router::<()>::new().route("/users/", Resource::new().get(worked)).is_ok());
}

#[test]
fn route_rejects_resources_without_a_verb() {
    let gibberish = Method::from_bytes(b"GIBBERISH").unwrap();
    let err = Router::new()
        .route("/", Resource::new().method(gibberish, worked))
        .unwrap_err();
    assert!(err.to_string().contains("valid HTTP verb"));
}

#[tokio::test]
async fn routes_a_basic_get() {
    let router: Router = Router::new().route("/", Resource::new().get(worked)).unwrap();
    let (status, _, body) = send(&router, "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");
}

#[tokio::test]
async fn routes_multiple_times() {
    let router: Router = Router::new()
        .route("/", Resource::new().get(failed))
        .unwrap()
        .route("/test", Resource::new().get(worked))
        .unwrap()
        .route("/test/:id", Resource::new().get(failed))
        .unwrap();

    assert_eq!(router.routes().len(), 3);
    assert_eq!(send(&router, "GET", "/test").await.2, "success");
}

#[tokio::test]
async fn first_registered_route_wins() {
    let router: Router = Router::new()
        .route("/test/new", Resource::new().get(worked))
        .unwrap()
        .route("/test/:id", Resource::new().get(failed))
        .unwrap();

    assert_eq!(send(&router, "GET", "/test/new").await.2, "success");
    assert_eq!(send(&router, "GET", "/test/old").await.2, "failed");
}

#[tokio::test]
async fn plain_post_is_ok() {
    let router: Router = Router::new().route("/", Resource::new().post(worked)).unwrap();
    let (status, _, body) = send(&router, "POST", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");
}

#[tokio::test]
async fn lowercase_methods_are_normalized() {
    let router: Router = Router::new().route("/", Resource::new().get(worked)).unwrap();
    assert_eq!(send(&router, "get", "/").await.2, "success");
}

#[tokio::test]
async fn lowercase_head_bodies_are_stripped() {
    let router: Router = Router::new().route("/", Resource::new().get(worked)).unwrap();
    let (status, _, body) = send(&router, "head", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");
}

#[tokio::test]
async fn resolve_ignores_matches_from_another_router() {
    let first: Router = Router::new().route("/first", Resource::new().get(worked)).unwrap();
    let second: Router = Router::new().route("/second", Resource::new().get(failed)).unwrap();

    let mut ctx = Context::new(request("GET", "/first"));
    assert_eq!(first.dispatch(&mut ctx, None).await.unwrap(), Outcome::Resolved(()));

    let outcome = second.resolve(&mut ctx, None).await.unwrap();
    assert_eq!(outcome, Outcome::Unmatched);
    assert_eq!(ctx.status(), StatusCode::NOT_FOUND);

    let outcome = first.resolve(&mut ctx, None).await.unwrap();
    assert_eq!(outcome, Outcome::Resolved(()));
    assert_eq!(ctx.status(), StatusCode::OK);
}

#[tokio::test]
async fn unmatched_is_not_found() {
    let router: Router = Router::new().route("/", Resource::new().get(worked)).unwrap();
    let (status, _, body) = send(&router, "GET", "/test").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");
}

#[tokio::test]
async fn unmatched_goes_to_the_continuation() {
    fn teapot(ctx: &mut Context) -> BoxFuture<'_, Result<(), BoxError>> {
        Box::pin(async move {
            ctx.set_status(StatusCode::IM_A_TEAPOT);
            Ok(())
        })
    }

    let router: Router = Router::new().route("/", Resource::new().get(worked)).unwrap();
    let next: Next<'_> = &teapot;

    let mut ctx = Context::new(request("GET", "/coffee"));
    let outcome = router.dispatch(&mut ctx, Some(next)).await.unwrap();
    assert_eq!(outcome, Outcome::Unmatched);
    assert_eq!(ctx.status(), StatusCode::IM_A_TEAPOT);

    let mut ctx = Context::new(request("GET", "/"));
    let outcome = router.dispatch(&mut ctx, Some(next)).await.unwrap();
    assert_eq!(outcome, Outcome::Resolved(()));
    assert_eq!(ctx.status(), StatusCode::OK);
}

#[tokio::test]
async fn continuation_errors_propagate() {
    let router: Router = Router::new();
    let next: Next<'_> = &bad_request;

    let mut ctx = Context::new(request("GET", "/"));
    let err = router.dispatch(&mut ctx, Some(next)).await.unwrap_err();
    assert_eq!(err.to_string(), "Bad Request");
}

#[tokio::test]
async fn adds_params() {
    let router: Router = Router::new()
        .route(
            "/a/:a/b/:b",
            Resource::new().get(|ctx| {
                Box::pin(async move {
                    let params: Vec<_> = ctx.params().iter().collect();
                    assert_eq!(params, [("a", "x"), ("b", "y")]);
                    ctx.set_body("success");
                    Ok(())
                })
            }),
        )
        .unwrap();

    assert_eq!(send(&router, "GET", "/a/x/b/y").await.2, "success");
}

#[tokio::test]
async fn params_are_decoded() {
    let router: Router = Router::new().route("/user/:name", Resource::new().get(worked)).unwrap();

    let mut ctx = Context::new(request("GET", "/user/J%C3%BCrgen%20M"));
    router.dispatch(&mut ctx, None).await.unwrap();
    assert_eq!(ctx.params().get("name"), Some("Jürgen M"));
}

#[tokio::test]
async fn adds_resource_and_route() {
    let router: Router = Router::new()
        .route("/widget/:id", Resource::new().name("widget").get(worked).delete(worked))
        .unwrap();

    let mut ctx = Context::new(request("GET", "/widget/1"));
    router.dispatch(&mut ctx, None).await.unwrap();

    let resource = ctx.resource().unwrap();
    assert_eq!(resource.name(), Some("widget"));
    assert_eq!(resource.methods(), [Method::GET, Method::DELETE]);
    assert_eq!(ctx.route().unwrap().to_string(), "/widget/:id");
}

#[tokio::test]
async fn optional_and_catch_all_params() {
    let router: Router = Router::new()
        .route("/docs/:page?", Resource::new().name("docs").get(worked))
        .unwrap()
        .route("/src/*filepath", Resource::new().name("src").get(worked))
        .unwrap();

    let mut ctx = Context::new(request("GET", "/docs"));
    router.dispatch(&mut ctx, None).await.unwrap();
    assert_eq!(ctx.resource().and_then(|r| r.name()), Some("docs"));
    assert!(ctx.params().get("page").is_none());

    let mut ctx = Context::new(request("GET", "/src/subdir/main.rs"));
    router.dispatch(&mut ctx, None).await.unwrap();
    assert_eq!(ctx.params().get("filepath"), Some("subdir/main.rs"));
}

#[tokio::test]
async fn regex_routes() {
    let pattern = Regex::new(r"^/files/(?P<name>[^/]+)\.(txt|md)$").unwrap();
    let router: Router = Router::new().route(pattern, Resource::new().get(worked)).unwrap();

    let mut ctx = Context::new(request("GET", "/files/notes.md"));
    router.dispatch(&mut ctx, None).await.unwrap();
    assert_eq!(ctx.params().get("name"), Some("notes"));
    assert_eq!(ctx.params().get("0"), Some("md"));

    assert_eq!(send(&router, "GET", "/files/notes.rs").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resource_ok_receives_the_resolution_value() {
    let router: Router<String> = Router::new()
        .route("/", Resource::new().get(|_| Box::pin(async { Ok("success".to_owned()) })))
        .unwrap()
        .resource_ok(|ctx, value| {
            ctx.set_body(value.clone());
            Ok(value)
        });

    let mut ctx = Context::new(request("GET", "/"));
    let outcome = router.dispatch(&mut ctx, None).await.unwrap();
    assert_eq!(outcome, Outcome::Resolved("success".to_owned()));

    assert_eq!(send(&router, "GET", "/").await.2, "success");
}

#[tokio::test]
async fn resource_errors_are_server_errors_by_default() {
    let router: Router = Router::new().route("/", Resource::new().get(bad_request)).unwrap();

    let (status, _, body) = send(&router, "GET", "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");

    let mut ctx = Context::new(request("GET", "/"));
    let err = router.dispatch(&mut ctx, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Bad Request");
}

#[tokio::test]
async fn resource_err_receives_the_error() {
    let router: Router = Router::new()
        .route("/", Resource::new().get(bad_request))
        .unwrap()
        .resource_err(|ctx, err| {
            ctx.set_status(StatusCode::BAD_REQUEST);
            ctx.set_body(err.to_string());
            ErrorAction::Handled
        });

    let mut ctx = Context::new(request("GET", "/"));
    assert_eq!(router.dispatch(&mut ctx, None).await.unwrap(), Outcome::Handled);

    let (status, _, body) = send(&router, "GET", "/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request");
}

#[tokio::test]
async fn resource_ok_errors_propagate() {
    let router: Router<u8> = Router::new()
        .route("/", Resource::new().get(|_| Box::pin(async { Ok(7) })))
        .unwrap()
        .resource_ok(|_, value| Err(BoxError::from(format!("rejected {}", value))));

    let mut ctx = Context::new(request("GET", "/"));
    let err = router.dispatch(&mut ctx, None).await.unwrap_err();
    assert_eq!(err.to_string(), "rejected 7");
}

#[tokio::test]
async fn method_not_allowed_by_default() {
    let router: Router = Router::new()
        .route("/", Resource::new().get(worked).put(worked))
        .unwrap();

    let (status, headers, body) = send(&router, "POST", "/").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "GET,PUT");
    assert_eq!(body, "Method Not Allowed");

    let mut ctx = Context::new(request("POST", "/"));
    assert_eq!(router.dispatch(&mut ctx, None).await.unwrap(), Outcome::Fallback);
}

#[tokio::test]
async fn sane_options_by_default() {
    let router: Router = Router::new()
        .route("/", Resource::new().get(worked).post(worked))
        .unwrap();

    let (status, headers, body) = send(&router, "OPTIONS", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ALLOW], "GET,POST");
    assert_eq!(body, "Allow: GET,POST");
}

#[tokio::test]
async fn options_lists_recognized_methods_only() {
    let gibberish = Method::from_bytes(b"GIBBERISH").unwrap();
    let router: Router = Router::new()
        .route("/", Resource::new().get(worked).method(gibberish, worked))
        .unwrap();

    let (status, headers, body) = send(&router, "OPTIONS", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ALLOW], "GET");
    assert_eq!(body, "Allow: GET");
    assert_eq!(router.allowed("/"), ["GET"]);
}

#[tokio::test]
async fn explicit_options_handler_wins() {
    let router: Router = Router::new()
        .route("/", Resource::new().get(failed).options(worked))
        .unwrap();

    let (status, headers, body) = send(&router, "OPTIONS", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(header::ALLOW).is_none());
    assert_eq!(body, "success");
}

#[tokio::test]
async fn sane_head_by_default() {
    let router: Router = Router::new().route("/", Resource::new().get(worked)).unwrap();

    let (status, _, body) = send(&router, "HEAD", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");

    let mut ctx = Context::new(request("HEAD", "/"));
    let outcome = router.dispatch(&mut ctx, None).await.unwrap();
    assert_eq!(outcome, Outcome::Resolved(()));
    assert_eq!(ctx.method(), &Method::GET);
    assert_eq!(ctx.request().method(), &Method::HEAD);
}

#[tokio::test]
async fn head_without_get_is_not_allowed() {
    let router: Router = Router::new().route("/", Resource::new().post(worked)).unwrap();

    let (status, headers, body) = send(&router, "HEAD", "/").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "POST");
    assert_eq!(body, "");
}

#[tokio::test]
async fn head_without_get_uses_the_configured_method_not_allowed() {
    let router: Router = Router::new()
        .route("/", Resource::new().post(worked))
        .unwrap()
        .handle(FallbackKind::MethodNotAllowed, |ctx, _, _| {
            Box::pin(async move {
                ctx.set_status(StatusCode::GONE);
                Ok(Outcome::Fallback)
            })
        });

    assert_eq!(send(&router, "HEAD", "/").await.0, StatusCode::GONE);
}

#[test]
fn handle_rejects_unknown_types() {
    let err = "BAD_KEY".parse::<FallbackKind>().unwrap_err();
    assert!(err.to_string().contains("BAD_KEY"));
}

#[tokio::test]
async fn handle_overrides_method_not_allowed() {
    let router: Router = Router::new()
        .route("/", Resource::new().get(worked))
        .unwrap()
        .handle("methodNotAllowed".parse().unwrap(), |ctx, _, _| {
            Box::pin(async move {
                ctx.set_status(StatusCode::METHOD_NOT_ALLOWED);
                ctx.set_body("No way, pal!");
                Ok(Outcome::Fallback)
            })
        });

    let (status, _, body) = send(&router, "POST", "/").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, "No way, pal!");
}

#[tokio::test]
async fn handle_overrides_options() {
    let router: Router = Router::new()
        .route("/", Resource::new().get(worked))
        .unwrap()
        .handle("OPTIONS".parse().unwrap(), |ctx, _, _| {
            Box::pin(async move {
                ctx.set_status(StatusCode::NOT_FOUND);
                ctx.set_body("Not found");
                Ok(Outcome::Fallback)
            })
        });

    let (status, _, body) = send(&router, "OPTIONS", "/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not found");
}

#[tokio::test]
async fn handle_overrides_head() {
    let router: Router = Router::new()
        .route("/", Resource::new().get(worked))
        .unwrap()
        .handle("HEAD".parse().unwrap(), |ctx, _, _| {
            Box::pin(async move {
                ctx.set_status(StatusCode::NOT_FOUND);
                Ok(Outcome::Fallback)
            })
        });

    let (status, _, body) = send(&router, "HEAD", "/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "");
}

#[tokio::test]
async fn routes_case_insensitive_by_default() {
    let router: Router = Router::new().route("/LOUD", Resource::new().get(worked)).unwrap();
    assert_eq!(send(&router, "GET", "/loud").await.2, "success");
}

#[tokio::test]
async fn accepts_a_case_sensitive_option() {
    let router: Router = Router::with_options(RouterOptions::default().case_sensitive(true))
        .route("/LOUD", Resource::new().get(worked))
        .unwrap();

    let (status, _, body) = send(&router, "GET", "/loud").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");
    assert_eq!(send(&router, "GET", "/LOUD").await.2, "success");
}

#[tokio::test]
async fn loose_about_trailing_slashes_by_default() {
    let router: Router = Router::new().route("/test", Resource::new().get(worked)).unwrap();
    assert_eq!(send(&router, "GET", "/test/").await.2, "success");
}

#[tokio::test]
async fn accepts_a_strict_option() {
    let router: Router = Router::with_options(RouterOptions::default().strict(true))
        .route("/test", Resource::new().get(worked))
        .unwrap();

    let (status, _, body) = send(&router, "GET", "/test/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");
    assert_eq!(send(&router, "GET", "/test").await.2, "success");
}

#[test]
fn collection_requires_a_collection() {
    let pair: Collection = Collection {
        collection: None,
        member: Some(Resource::new().get(worked)),
    };
    let err = Router::new().collection("/test/:id", pair).unwrap_err();
    assert!(matches!(err, Error::MissingCollection(_)));
}

#[tokio::test]
async fn does_just_collection_routing() {
    let router: Router = Router::new()
        .collection("/test/:id/", Collection::new(Resource::new().get(worked)))
        .unwrap();

    assert_eq!(router.routes().len(), 1);
    assert_eq!(send(&router, "GET", "/test").await.2, "success");
    assert_eq!(send(&router, "GET", "/test/abcd").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn does_member_and_collection_routing() {
    let member = Resource::new().get(|ctx| {
        Box::pin(async move {
            let id = ctx.params().get("id").unwrap_or_default().to_owned();
            ctx.set_body(id);
            Ok(())
        })
    });
    let router: Router = Router::new()
        .collection("/test/:id", Collection::new(Resource::new().get(worked)).member(member))
        .unwrap();

    assert_eq!(send(&router, "GET", "/test").await.2, "success");

    let (status, _, body) = send(&router, "GET", "/test/abcd").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "abcd");
}

#[test]
fn apply_calls_the_plugin_with_the_router() {
    let mut seen = 0;
    let router: Router = Router::new()
        .apply(|router| {
            seen = router.routes().len() + 1;
            router.route("/", Resource::new().get(worked))
        })
        .unwrap();

    assert_eq!(seen, 1);
    assert_eq!(router.routes().len(), 1);
}

#[tokio::test]
async fn informative_error_when_decoding_fails() {
    let router: Router = Router::new().route("/user/:id", Resource::new().get(worked)).unwrap();

    let err = router.lookup("/user/%E0%A4%A").unwrap_err();
    assert!(matches!(err, Error::DecodeParam(ref raw) if raw == "%E0%A4%A"));

    let (status, _, body) = send(&router, "GET", "/user/%E0%A4%A").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("%E0%A4%A"));
}

#[tokio::test]
async fn into_service_answers_requests() {
    use hyper::service::Service;

    let router: Router = Router::new().route("/", Resource::new().get(worked)).unwrap();
    let mut make = router.into_service();
    let mut service = make.call(()).await.unwrap();

    let response = service.call(request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(&body[..], b"success");
}
