//! End-to-end tests: real sockets, real HTTP, through `Service`.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use trellis::middleware::Next;
use trellis::{Error, Request, Response, Route, Router, Service, ServiceConfig, StatusCode};

/// A startup-message sink the test can read back.
#[derive(Clone, Default)]
struct Sink(Arc<Mutex<Vec<u8>>>);

impl Sink {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Running {
    base: String,
    port: u16,
    stop: oneshot::Sender<()>,
    done: JoinHandle<Result<(), Error>>,
}

async fn spawn(router: Router, config: ServiceConfig) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (stop, stopped) = oneshot::channel::<()>();

    let service = Service::new(config, router);
    let done = tokio::spawn(service.serve(listener, async move {
        let _ = stopped.await;
    }));

    Running { base: format!("http://127.0.0.1:{port}"), port, stop, done }
}

async fn require_token(req: Request, next: Next) -> Response {
    match req.header("authorization") {
        Some("Bearer secret") => next.run(req).await,
        _ => Response::status(StatusCode::UNAUTHORIZED),
    }
}

async fn echo(req: Request) -> Response {
    let id = req.param("id").unwrap_or_default();
    let body = String::from_utf8_lossy(req.body());
    Response::text(format!("{id}:{body}"))
}

#[tokio::test]
async fn health_answers_ok_and_startup_line_is_written() {
    let mut router = Router::new();
    router.health();

    let sink = Sink::default();
    let running = spawn(router, ServiceConfig::default().writer(sink.clone())).await;

    let res = reqwest::get(format!("{}/health", running.base)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");

    assert_eq!(sink.contents(), format!("Service is starting on port {}\n", running.port));
}

#[tokio::test]
async fn base_short_circuit_answers_health_probe() {
    let mut router = Router::new();
    router.health().base(require_token);

    let running = spawn(router, ServiceConfig::default()).await;
    let http = reqwest::Client::new();
    let url = format!("{}/health", running.base);

    let res = http.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text().await.unwrap(), "");

    let res = http.get(&url).bearer_auth("secret").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn named_pipeline_guards_only_its_routes() {
    let mut router = Router::new();
    router.attach("auth", require_token).routes([
        Route::put("/users/{id}", echo).middleware("auth"),
        Route::get("/public/{id}", echo),
    ]);

    let running = spawn(router, ServiceConfig::default()).await;
    let http = reqwest::Client::new();

    let res = http.put(format!("{}/users/5", running.base)).body("bob").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = http
        .put(format!("{}/users/5", running.base))
        .bearer_auth("secret")
        .body("bob")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "5:bob");

    let res = http.get(format!("{}/public/9", running.base)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "9:");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let running = spawn(Router::new(), ServiceConfig::default()).await;

    let res = reqwest::get(format!("{}/missing", running.base)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn slow_handler_hits_the_timeout() {
    async fn slow(_req: Request) -> &'static str {
        tokio::time::sleep(Duration::from_secs(2)).await;
        "late"
    }

    let mut router = Router::new();
    router.route(Route::get("/slow", slow));

    let config = ServiceConfig::default().timeout(Duration::from_millis(100));
    let running = spawn(router, config).await;

    let res = reqwest::get(format!("{}/slow", running.base)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn stops_cleanly_on_shutdown() {
    let mut router = Router::new();
    router.health();
    let running = spawn(router, ServiceConfig::default()).await;

    let http = reqwest::Client::new();
    let res = http.get(format!("{}/health", running.base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    drop(res);
    drop(http);

    running.stop.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), running.done)
        .await
        .expect("service did not drain")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn start_returns_bind_error() {
    let taken = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let service = Service::new(ServiceConfig::default().port(port), Router::new());
    assert_eq!(service.port(), port);

    let err = service.start().await.unwrap_err();
    assert!(matches!(err, Error::Bind { .. }), "{err}");
}

#[test]
fn zero_port_means_default() {
    let service = Service::new(ServiceConfig::default(), Router::new());
    assert_eq!(service.port(), trellis::DEFAULT_PORT);
}

#[tokio::test]
async fn timeout_also_covers_http2_connections() {
    async fn slow(_req: Request) -> &'static str {
        tokio::time::sleep(Duration::from_secs(2)).await;
        "late"
    }

    let mut router = Router::new();
    router.health().route(Route::get("/slow", slow));

    let config = ServiceConfig::default().timeout(Duration::from_millis(200));
    let running = spawn(router, config).await;
    let http = reqwest::Client::builder().http2_prior_knowledge().build().unwrap();

    let res = http.get(format!("{}/health", running.base)).send().await.unwrap();
    assert_eq!(res.version(), reqwest::Version::HTTP_2);
    assert_eq!(res.status(), StatusCode::OK);

    let res = http.get(format!("{}/slow", running.base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}
