use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use edgeshim_adapter_axum::{AxumDevServer, AxumDevServerConfig};
use edgeshim_core::router::RouterService;
use edgeshim_core::settings::SettingsLoader;
use edgeshim_express::{mount, RouteContext, RouteDescriptor, RouteHandler, RouteMeta};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    _web_root: tempfile::TempDir,
}

struct Echo;

#[async_trait(?Send)]
impl RouteHandler for Echo {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        ctx.res.json(json!({
            "status": true,
            "body": ctx.req.body().clone(),
            "q": ctx.req.query_param("q"),
            "host": ctx.req.host(),
        }));
        Ok(())
    }
}

fn app() -> RouterService {
    let settings = SettingsLoader::load_from_str(r#"{"apiSettings":{"operator":"Dev Op"}}"#)
        .expect("settings")
        .shared();
    mount(
        vec![RouteDescriptor::new(
            RouteMeta::new("/echo?q=").method("all").category("Debug"),
            Echo,
        )],
        settings,
    )
}

async fn start_test_server(router: RouterService) -> TestServer {
    let web_root = tempfile::tempdir().expect("web root");
    std::fs::write(web_root.path().join("index.html"), "<h1>EdgeShim</h1>").expect("index");
    std::fs::write(web_root.path().join("app.js"), "console.log(1)").expect("script");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    let config = AxumDevServerConfig {
        addr,
        enable_ctrl_c: false,
        web_root: Some(web_root.path().to_path_buf()),
    };
    let server = AxumDevServer::with_config(router, config);

    let handle = tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    TestServer {
        base_url: format!("http://{addr}"),
        handle,
        _web_root: web_root,
    }
}

async fn send_with_retry<F>(client: &reqwest::Client, mut make_request: F) -> reqwest::Response
where
    F: FnMut(&reqwest::Client) -> reqwest::RequestBuilder,
{
    let start = Instant::now();
    let timeout = Duration::from_secs(2);

    loop {
        match make_request(client).send().await {
            Ok(response) => return response,
            Err(err) => {
                if start.elapsed() >= timeout {
                    panic!("server did not respond before timeout: {err}");
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn json_body(response: reqwest::Response) -> Value {
    serde_json::from_str(&response.text().await.expect("text")).expect("json")
}

#[tokio::test(flavor = "multi_thread")]
async fn api_route_sees_query_and_json_body() {
    let server = start_test_server(app()).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/echo?q=first&q=last", server.base_url);

    let response = send_with_retry(&client, |client| {
        client
            .post(url.as_str())
            .header("content-type", "application/json")
            .body(r#"{"name":"rynn"}"#)
    })
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["operator"], "Dev Op");
    assert_eq!(body["body"], json!({ "name": "rynn" }));
    assert_eq!(body["q"], "last");
    assert!(body["host"]
        .as_str()
        .expect("host")
        .starts_with("127.0.0.1:"));

    server.handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn form_body_is_decoded() {
    let server = start_test_server(app()).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/echo", server.base_url);

    let response = send_with_retry(&client, |client| {
        client
            .put(url.as_str())
            .header("content-type", "application/x-www-form-urlencoded")
            .body("a=1&b=two")
    })
    .await;

    let body = json_body(response).await;
    assert_eq!(body["body"], json!({ "a": "1", "b": "two" }));

    server.handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn info_endpoint_lists_mounted_routes() {
    let server = start_test_server(app()).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/info", server.base_url);

    let response = send_with_retry(&client, |client| client.get(url.as_str())).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "categories": [{
                "name": "Debug",
                "items": [{ "path": "/api/echo?q=", "method": "all" }]
            }]
        })
    );

    server.handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn static_files_and_404() {
    let server = start_test_server(app()).await;
    let client = reqwest::Client::new();

    let index = format!("{}/", server.base_url);
    let response = send_with_retry(&client, |client| client.get(index.as_str())).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/html; charset=utf-8"
    );
    assert_eq!(response.text().await.expect("text"), "<h1>EdgeShim</h1>");

    let script = format!("{}/app.js", server.base_url);
    let response = send_with_retry(&client, |client| client.get(script.as_str())).await;
    assert_eq!(response.headers()["content-type"], "application/javascript");

    let missing = format!("{}/missing.css", server.base_url);
    let response = send_with_retry(&client, |client| client.get(missing.as_str())).await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.expect("text"), "404 Not Found");

    server.handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn shared_settings_survive_many_requests() {
    let server = start_test_server(app()).await;
    let client = Arc::new(reqwest::Client::new());
    let url = Arc::new(format!("{}/api/echo", server.base_url));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let client = Arc::clone(&client);
        let url = Arc::clone(&url);
        tasks.push(tokio::spawn(async move {
            let response = send_with_retry(&client, |client| client.get(url.as_str())).await;
            json_body(response).await
        }));
    }

    for task in tasks {
        let body = task.await.expect("task");
        assert_eq!(body["operator"], "Dev Op");
        assert_eq!(body["body"], json!({}));
    }

    server.handle.abort();
}
