use actix_web::{test, web, App, HttpRequest, HttpResponse};
use uuid::Uuid;

use commons_middleware::correlation_id::{
    correlation_id, CorrelationConfig, CorrelationIdMiddleware,
};

fn middleware(header: &str) -> CorrelationIdMiddleware {
    CorrelationIdMiddleware::new(CorrelationConfig {
        header: header.to_string(),
    })
    .expect("valid header name")
}

/// Echoes the stored token so tests can observe the request-scoped value
async fn echo_token(req: HttpRequest) -> HttpResponse {
    match correlation_id(&req) {
        Some(id) => HttpResponse::Ok().body(id.into_inner()),
        None => HttpResponse::InternalServerError().finish(),
    }
}

#[actix_web::test]
async fn inbound_token_is_stored_and_reflected() {
    let app = test::init_service(
        App::new()
            .wrap(middleware("testKey"))
            .route("/", web::get().to(echo_token)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("testKey", "testValue"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.headers().get("testKey").unwrap(), "testValue");
    let body = test::read_body(res).await;
    assert_eq!(body, "testValue");
}

#[actix_web::test]
async fn missing_token_is_generated() {
    let app = test::init_service(
        App::new()
            .wrap(middleware("X-Correlation-ID"))
            .route("/", web::get().to(echo_token)),
    )
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let res = test::call_service(&app, req).await;

    let reflected = res
        .headers()
        .get("X-Correlation-ID")
        .expect("response header present")
        .to_str()
        .unwrap()
        .to_string();
    assert!(Uuid::parse_str(&reflected).is_ok());

    // The stored token and the reflected one are the same value.
    let body = test::read_body(res).await;
    assert_eq!(body, reflected.as_bytes());
}

#[actix_web::test]
async fn generated_tokens_differ_between_requests() {
    let app = test::init_service(
        App::new()
            .wrap(middleware("X-Correlation-ID"))
            .route("/", web::get().to(echo_token)),
    )
    .await;

    let first = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let second = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_ne!(
        first.headers().get("X-Correlation-ID").unwrap(),
        second.headers().get("X-Correlation-ID").unwrap()
    );
}

#[actix_web::test]
async fn handler_set_header_is_not_overwritten() {
    async fn sets_own_header() -> HttpResponse {
        HttpResponse::Ok()
            .insert_header(("X-Correlation-ID", "handler-set"))
            .finish()
    }

    let app = test::init_service(
        App::new()
            .wrap(middleware("X-Correlation-ID"))
            .route("/", web::get().to(sets_own_header)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("X-Correlation-ID", "inbound-token"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.headers().get("X-Correlation-ID").unwrap(), "handler-set");
}

#[actix_web::test]
async fn error_responses_still_carry_the_token() {
    async fn failing() -> Result<HttpResponse, actix_web::Error> {
        Err(actix_web::error::ErrorBadRequest("boom"))
    }

    let app = test::init_service(
        App::new()
            .wrap(middleware("X-Correlation-ID"))
            .route("/", web::get().to(failing)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("X-Correlation-ID", "inbound-token"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), 400);
    assert_eq!(
        res.headers().get("X-Correlation-ID").unwrap(),
        "inbound-token"
    );
}
