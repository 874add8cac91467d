#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use poem::http::StatusCode;
use poem::listener::{Acceptor, Listener, TcpListener};
use poem::web::{Data, Json, Path, Query};
use poem::{
    get, handler, post, put, Endpoint, EndpointExt, IntoResponse, Request, Response, Route, Server,
};
use serde::Deserialize;
use serde_json::{json, Value};

use buildkite_dash::discovery::UrlPatternDiscovery;
use buildkite_dash::{RestClient, TravisClient};

pub const ORG: &str = "rbnetwork";
pub const PIPELINE: &str = "example-pipeline";

/// What the fake proxy saw and how it should answer.
#[derive(Default)]
pub struct ProxyState {
    requests: Mutex<Vec<String>>,
    fail_with: Mutex<Option<u16>>,
    fail_lists_with: Mutex<Option<u16>>,
    raw_body: Mutex<Option<String>>,
    newest_build: Mutex<u64>,
}

impl ProxyState {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fail_with(&self, status: Option<u16>) {
        *self.fail_with.lock().unwrap() = status;
    }

    /// Fails only build list requests, other calls keep working.
    pub fn fail_lists_with(&self, status: Option<u16>) {
        *self.fail_lists_with.lock().unwrap() = status;
    }

    pub fn answer_with(&self, body: &str) {
        *self.raw_body.lock().unwrap() = Some(body.to_string());
    }

    fn record(&self, req: &Request) -> Option<Response> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", req.method(), req.uri()));

        if let Some(status) = *self.fail_with.lock().unwrap() {
            return Some(denied(status));
        }
        self.raw_body
            .lock()
            .unwrap()
            .clone()
            .map(|body| Response::builder().content_type("application/json").body(body))
    }
}

fn denied(status: u16) -> Response {
    Response::builder()
        .status(StatusCode::from_u16(status).unwrap())
        .body("denied")
}

pub fn build_json(number: u64, state: &str) -> Value {
    json!({
        "id": format!("0184990a-{:04}", number),
        "number": number,
        "message": "Update catalog-info.yaml",
        "branch": "main",
        "commit": "a5d3e0f",
        "state": state,
        "created_at": "2020-11-05T12:00:00.000Z",
        "rebuilt_from": null,
        "pipeline": {
            "slug": PIPELINE,
            "provider": { "repository": "git@github.com:rbnetwork/example-pipeline.git" }
        },
        "url": format!("https://api.buildkite.com/v2/organizations/{}/pipelines/{}/builds/{}", ORG, PIPELINE, number),
        "web_url": format!("https://buildkite.com/{}/{}/builds/{}", ORG, PIPELINE, number),
        "jobs": [{
            "id": "job-1",
            "state": state,
            "name": ":hammer: build",
            "log_url": format!("https://api.buildkite.com/v2/organizations/{}/pipelines/{}/builds/{}/jobs/job-1/log", ORG, PIPELINE, number),
            "started_at": "2020-11-05T12:00:05Z",
            "finished_at": null
        }]
    })
}

#[derive(Deserialize)]
struct PageQuery {
    page: u64,
    per_page: u64,
}

#[handler]
fn list_builds(
    req: &Request,
    Query(query): Query<PageQuery>,
    state: Data<&Arc<ProxyState>>,
) -> Response {
    if let Some(res) = state.record(req) {
        return res;
    }
    if let Some(status) = *state.fail_lists_with.lock().unwrap() {
        return denied(status);
    }
    let newest = *state.newest_build.lock().unwrap();
    let first = newest.saturating_sub(query.page.saturating_sub(1) * query.per_page);
    let builds: Vec<Value> = (0..query.per_page)
        .filter_map(|i| first.checked_sub(i).filter(|n| *n > 0))
        .map(|n| build_json(n, "queued"))
        .collect();
    Json(builds).into_response()
}

#[handler]
fn single_build(
    req: &Request,
    Path((_org, _pipeline, number)): Path<(String, String, u64)>,
    state: Data<&Arc<ProxyState>>,
) -> Response {
    if let Some(res) = state.record(req) {
        return res;
    }
    Json(build_json(number, "passed")).into_response()
}

#[handler]
fn rebuild(
    req: &Request,
    Path((_org, _pipeline, _number)): Path<(String, String, u64)>,
    state: Data<&Arc<ProxyState>>,
) -> Response {
    if let Some(res) = state.record(req) {
        return res;
    }
    let mut newest = state.newest_build.lock().unwrap();
    *newest += 1;
    Json(build_json(*newest, "scheduled")).into_response()
}

#[handler]
fn job_log(
    req: &Request,
    Path((_org, _pipeline, _number, job)): Path<(String, String, u64, String)>,
    state: Data<&Arc<ProxyState>>,
) -> Response {
    if let Some(res) = state.record(req) {
        return res;
    }
    let content = format!("--- running {}\nok\n", job);
    Json(json!({
        "url": "https://api.buildkite.com/v2/log",
        "size": content.len(),
        "content": content,
    }))
    .into_response()
}

pub fn travis_build_json(id: u64, state: &str) -> Value {
    json!({
        "@type": "build",
        "@permissions": { "read": true, "cancel": false, "restart": true },
        "id": id,
        "number": (id - 800).to_string(),
        "state": state,
        "duration": 64,
        "event_type": "push",
        "started_at": "2020-11-05T12:00:00Z",
        "finished_at": null,
        "repository": { "id": 1, "name": PIPELINE, "slug": format!("{}/{}", ORG, PIPELINE) },
        "branch": { "name": "main" },
        "commit": {
            "id": id + 1000,
            "sha": "a5d3e0f",
            "ref": "refs/heads/main",
            "message": "Update catalog-info.yaml",
            "compare_url": "https://github.com/rbnetwork/example-pipeline/compare/a...b",
            "committed_at": "2020-11-05T11:59:00Z"
        },
        "jobs": [{ "id": id * 10 }],
        "created_by": { "id": 3, "login": "octocat" }
    })
}

/// Travis rejects v2 style calls, so does the fake.
fn travis_checks(req: &Request, state: &ProxyState) -> Option<Response> {
    state.record(req).or_else(|| match req.header("Travis-API-Version") {
        Some("3") => None,
        _ => Some(denied(412)),
    })
}

#[derive(Deserialize)]
struct TravisPageQuery {
    limit: u64,
    offset: u64,
}

#[handler]
fn travis_builds(
    req: &Request,
    Query(query): Query<TravisPageQuery>,
    state: Data<&Arc<ProxyState>>,
) -> Response {
    if let Some(res) = travis_checks(req, &state) {
        return res;
    }
    let builds: Vec<Value> = (0..query.limit)
        .map(|i| travis_build_json(900 - query.offset - i, "passed"))
        .collect();
    Json(json!({ "@type": "builds", "builds": builds })).into_response()
}

#[handler]
fn travis_build(req: &Request, Path(id): Path<u64>, state: Data<&Arc<ProxyState>>) -> Response {
    if let Some(res) = travis_checks(req, &state) {
        return res;
    }
    Json(travis_build_json(id, "started")).into_response()
}

#[handler]
fn travis_restart(req: &Request, Path(id): Path<u64>, state: Data<&Arc<ProxyState>>) -> Response {
    if let Some(res) = travis_checks(req, &state) {
        return res;
    }
    Json(json!({ "@type": "pending", "build": { "id": id }, "flash": [] }))
        .with_status(StatusCode::ACCEPTED)
        .into_response()
}

#[handler]
fn travis_user(req: &Request, state: Data<&Arc<ProxyState>>) -> Response {
    if let Some(res) = travis_checks(req, &state) {
        return res;
    }
    Json(json!({ "id": 3, "login": "octocat", "name": "Octo Cat" })).into_response()
}

/// Serves `app` on a random local port and returns its base url.
pub async fn serve(app: impl Endpoint + 'static) -> String {
    let acceptor = TcpListener::bind("127.0.0.1:0")
        .into_acceptor()
        .await
        .unwrap();
    let addr = *acceptor.local_addr()[0].as_socket_addr().unwrap();
    tokio::spawn(Server::new_with_acceptor(acceptor).run(app));
    format!("http://{}", addr)
}

/// Starts a fake Buildkite proxy whose newest build is `newest_build`.
pub async fn fake_proxy(newest_build: u64) -> (String, Arc<ProxyState>) {
    let state = Arc::new(ProxyState::default());
    *state.newest_build.lock().unwrap() = newest_build;

    let prefix = "/buildkite/api/organizations/:org/pipelines/:pipeline/builds/:number";
    let app = Route::new()
        .at("/buildkite/api/builds", get(list_builds))
        .at(prefix, get(single_build))
        .at(&format!("{}/rebuild", prefix), put(rebuild))
        .at(&format!("{}/jobs/:job/log", prefix), get(job_log))
        .at("/travisci/api/repo/:slug/builds", get(travis_builds))
        .at("/travisci/api/build/:id", get(travis_build))
        .at("/travisci/api/build/:id/restart", post(travis_restart))
        .at("/travisci/api/user", get(travis_user))
        .data(state.clone());

    (serve(app).await, state)
}

pub fn client(proxy_url: &str) -> RestClient {
    let discovery = UrlPatternDiscovery::compile(proxy_url).unwrap();
    RestClient::new(Arc::new(discovery))
}

pub fn travis_client(proxy_url: &str) -> TravisClient {
    let discovery = UrlPatternDiscovery::compile(proxy_url).unwrap();
    TravisClient::new(Arc::new(discovery))
}
