//! Loopback DICOMweb server for exercising the HTTP backends.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use crate::multipart;

pub const BULK_VALUE: &[u8] = b"\x00\x10bulk-value";

#[derive(Default)]
struct ServerState {
    authorizations: Mutex<Vec<Option<String>>>,
    stored: Mutex<Vec<String>>,
}

pub struct Fixture {
    pub root: String,
    state: Arc<ServerState>,
}

impl Fixture {
    /// `Authorization` header of every series search, in arrival order.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.state.authorizations.lock().unwrap().clone()
    }

    pub fn stored_bodies(&self) -> Vec<String> {
        self.state.stored.lock().unwrap().clone()
    }
}

pub async fn spawn() -> Fixture {
    let state = Arc::new(ServerState::default());
    let app = Router::new()
        .route("/dicom-web/studies", post(store))
        .route("/dicom-web/studies/:study/series", get(series_listing))
        .route("/dicom-web/studies/:study/series/:series/metadata", get(series_metadata))
        .route("/dicom-web/studies/:study/bulk/pixel", get(bulk_data))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Fixture {
        root: format!("http://{addr}/dicom-web"),
        state,
    }
}

pub fn instances(study: &str, series: &str, count: usize) -> Value {
    let items: Vec<Value> = (1..=count)
        .map(|n| {
            json!({
                "0020000D": { "vr": "UI", "Value": [study] },
                "0020000E": { "vr": "UI", "Value": [series] },
                "00080018": { "vr": "UI", "Value": [format!("{series}.{n}")] },
                "00200013": { "vr": "IS", "Value": [n] },
                "7FE00010": { "vr": "OW", "BulkDataURI": "bulk/pixel" }
            })
        })
        .collect();
    Value::Array(items)
}

fn dicom_json(body: Value) -> Response {
    ([(header::CONTENT_TYPE, "application/dicom+json")], body.to_string()).into_response()
}

async fn series_listing(
    State(state): State<Arc<ServerState>>,
    Path(study): Path<String>,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.authorizations.lock().unwrap().push(authorization);
    dicom_json(json!([
        {
            "0020000D": { "vr": "UI", "Value": [study] },
            "0020000E": { "vr": "UI", "Value": ["S1"] },
            "00080060": { "vr": "CS", "Value": ["CT"] },
            "00201209": { "vr": "IS", "Value": [3] }
        },
        {
            "0020000D": { "vr": "UI", "Value": [study] },
            "0020000E": { "vr": "UI", "Value": ["S2"] },
            "00080060": { "vr": "CS", "Value": ["SR"] },
            "00201209": { "vr": "IS", "Value": [2] }
        }
    ]))
}

async fn series_metadata(Path((study, series)): Path<(String, String)>) -> Response {
    match series.as_str() {
        "missing" => StatusCode::NOT_FOUND.into_response(),
        "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "S1" => dicom_json(instances(&study, "S1", 3)),
        other => dicom_json(instances(&study, other, 2)),
    }
}

async fn bulk_data() -> Response {
    let body = multipart::encode_related(&[("application/octet-stream", BULK_VALUE)], "srv");
    (
        [(
            header::CONTENT_TYPE,
            "multipart/related; type=\"application/octet-stream\"; boundary=srv",
        )],
        body,
    )
        .into_response()
}

async fn store(State(state): State<Arc<ServerState>>, body: String) -> StatusCode {
    state.stored.lock().unwrap().push(body);
    StatusCode::OK
}
