//! Graph downloads against an in-process mock registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use stowage_core::domain::oci::{OCI_IMAGE_INDEX, OCI_IMAGE_MANIFEST};
use stowage_core::{Credentials, Digest, DownloadError, Downloader, Locator};
use stowage_oci::{OciClientConfig, OciDownloader, RegistryClient};
use tokio::io::AsyncReadExt;

const REPOSITORY: &str = "models/demo";
const TOKEN: &str = "registry-token";

#[derive(Clone, Copy)]
enum Auth {
    Anonymous,
    Token,
    Basic,
}

fn basic() -> Credentials {
    Credentials::Basic {
        username: "puller".into(),
        password: "hunter2".into(),
    }
}

struct MockRegistry {
    auth: Auth,
    realm: String,
    manifests: HashMap<String, (&'static str, Vec<u8>)>,
    blobs: HashMap<String, Vec<u8>>,
    digest_header: Option<String>,
    token_requests: AtomicUsize,
}

impl MockRegistry {
    fn authorize(&self, headers: &HeaderMap) -> Option<Response> {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let (expected, challenge) = match self.auth {
            Auth::Anonymous => return None,
            Auth::Token => (
                format!("Bearer {TOKEN}"),
                format!(
                    r#"Bearer realm="{}",service="mock-registry",scope="repository:{REPOSITORY}:pull""#,
                    self.realm
                ),
            ),
            Auth::Basic => (basic().authorization_header(), r#"Basic realm="mock""#.to_string()),
        };
        (presented != Some(expected.as_str()))
            .then(|| (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, challenge)]).into_response())
    }
}

async fn v2(
    State(registry): State<Arc<MockRegistry>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(denied) = registry.authorize(&headers) {
        return denied;
    }
    if let Some((_, reference)) = path.split_once("/manifests/") {
        return match registry.manifests.get(reference) {
            Some((media_type, body)) => {
                let digest = registry
                    .digest_header
                    .clone()
                    .unwrap_or_else(|| Digest::of_bytes(body).to_string());
                (
                    [
                        (header::CONTENT_TYPE, (*media_type).to_string()),
                        (HeaderName::from_static("docker-content-digest"), digest),
                    ],
                    body.clone(),
                )
                    .into_response()
            }
            None => StatusCode::NOT_FOUND.into_response(),
        };
    }
    if let Some((_, digest)) = path.split_once("/blobs/") {
        return registry
            .blobs
            .get(digest)
            .map_or_else(|| StatusCode::NOT_FOUND.into_response(), |b| b.clone().into_response());
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn token(
    State(registry): State<Arc<MockRegistry>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    registry.token_requests.fetch_add(1, Ordering::SeqCst);
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(basic().authorization_header().as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let expected_scope = format!("repository:{REPOSITORY}:pull");
    if params.get("scope") != Some(&expected_scope)
        || params.get("service").map(String::as_str) != Some("mock-registry")
    {
        return StatusCode::BAD_REQUEST.into_response();
    }
    axum::Json(json!({ "token": TOKEN })).into_response()
}

fn descriptor(media_type: &str, bytes: &[u8]) -> serde_json::Value {
    json!({
        "mediaType": media_type,
        "digest": Digest::of_bytes(bytes).to_string(),
        "size": bytes.len(),
    })
}

/// Index -> two manifests -> one layer each, both sharing one config.
struct Graph {
    index: Vec<u8>,
    manifests: Vec<Vec<u8>>,
    layers: Vec<Vec<u8>>,
    config: Vec<u8>,
}

impl Graph {
    fn new() -> Self {
        let config = b"{}".to_vec();
        let layers = vec![b"weights for amd64".to_vec(), b"weights for arm64".to_vec()];
        let manifests: Vec<Vec<u8>> = layers
            .iter()
            .map(|layer| {
                serde_json::to_vec(&json!({
                    "schemaVersion": 2,
                    "mediaType": OCI_IMAGE_MANIFEST,
                    "config": descriptor("application/vnd.oci.image.config.v1+json", &config),
                    "layers": [descriptor("application/vnd.oci.image.layer.v1.tar", layer)],
                }))
                .unwrap()
            })
            .collect();
        let index = serde_json::to_vec(&json!({
            "schemaVersion": 2,
            "mediaType": OCI_IMAGE_INDEX,
            "manifests": manifests
                .iter()
                .map(|m| descriptor(OCI_IMAGE_MANIFEST, m))
                .collect::<Vec<_>>(),
        }))
        .unwrap();
        Self {
            index,
            manifests,
            layers,
            config,
        }
    }

    /// Digests in breadth-first order with the shared config emitted once.
    fn expected_order(&self) -> Vec<Digest> {
        [
            &self.index,
            &self.manifests[0],
            &self.manifests[1],
            &self.layers[0],
            &self.config,
            &self.layers[1],
        ]
        .into_iter()
        .map(|b| Digest::of_bytes(b))
        .collect()
    }
}

async fn serve(
    auth: Auth,
    graph: &Graph,
    tweak: impl FnOnce(&mut MockRegistry),
) -> (String, Arc<MockRegistry>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut manifests = HashMap::new();
    manifests.insert("latest".to_string(), (OCI_IMAGE_INDEX, graph.index.clone()));
    manifests.insert(
        Digest::of_bytes(&graph.index).to_string(),
        (OCI_IMAGE_INDEX, graph.index.clone()),
    );
    for manifest in &graph.manifests {
        manifests.insert(
            Digest::of_bytes(manifest).to_string(),
            (OCI_IMAGE_MANIFEST, manifest.clone()),
        );
    }
    let blobs = graph
        .layers
        .iter()
        .chain(std::iter::once(&graph.config))
        .map(|b| (Digest::of_bytes(b).to_string(), b.clone()))
        .collect();

    let mut registry = MockRegistry {
        auth,
        realm: format!("http://{addr}/token"),
        manifests,
        blobs,
        digest_header: None,
        token_requests: AtomicUsize::new(0),
    };
    tweak(&mut registry);
    let registry = Arc::new(registry);

    let app = Router::new()
        .route("/v2/{*path}", get(v2))
        .route("/token", get(token))
        .with_state(Arc::clone(&registry));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr.to_string(), registry)
}

fn downloader(addr: &str, reference: &str, credentials: Option<Credentials>) -> OciDownloader {
    let client = RegistryClient::new(OciClientConfig::new().with_plain_http(addr)).unwrap();
    let locator = Locator::parse(&format!("oci://{addr}/{REPOSITORY}{reference}")).unwrap();
    OciDownloader::new(Arc::new(client), &locator, credentials).unwrap()
}

#[tokio::test]
async fn test_walks_graph_breadth_first_root_first() {
    let graph = Graph::new();
    let (addr, _registry) = serve(Auth::Anonymous, &graph, |_| {}).await;

    let items = downloader(&addr, ":latest", None).download().await.unwrap();
    let digests: Vec<Digest> = items.iter().map(|i| i.digest.clone().unwrap()).collect();
    assert_eq!(digests, graph.expected_order());

    for (item, expected) in items.into_iter().zip([
        &graph.index,
        &graph.manifests[0],
        &graph.manifests[1],
        &graph.layers[0],
        &graph.config,
        &graph.layers[1],
    ]) {
        assert_eq!(item.size, Some(expected.len() as u64));
        let mut reader = item.reader;
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(&body, expected);
    }
}

#[tokio::test]
async fn test_default_tag_and_digest_reference() {
    let graph = Graph::new();
    let (addr, _registry) = serve(Auth::Anonymous, &graph, |_| {}).await;

    let by_default = downloader(&addr, "", None).download().await.unwrap();
    assert_eq!(by_default.len(), 6);

    let pinned = format!("@{}", Digest::of_bytes(&graph.index));
    let by_digest = downloader(&addr, &pinned, None).download().await.unwrap();
    assert_eq!(by_digest[0].digest, Some(Digest::of_bytes(&graph.index)));
}

#[tokio::test]
async fn test_token_flow_with_basic_credentials() {
    let graph = Graph::new();
    let (addr, registry) = serve(Auth::Token, &graph, |_| {}).await;

    let items = downloader(&addr, ":latest", Some(basic()))
        .download()
        .await
        .unwrap();
    assert_eq!(items.len(), 6);
    assert_eq!(registry.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_bearer_credentials_are_sent_directly() {
    let graph = Graph::new();
    let (addr, registry) = serve(Auth::Token, &graph, |_| {}).await;

    let items = downloader(&addr, ":latest", Some(Credentials::Bearer(TOKEN.into())))
        .download()
        .await
        .unwrap();
    assert_eq!(items.len(), 6);
    assert_eq!(registry.token_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_refused_without_credentials() {
    let graph = Graph::new();
    let (addr, _registry) = serve(Auth::Token, &graph, |_| {}).await;

    let err = downloader(&addr, ":latest", None).download().await.err().unwrap();
    assert!(matches!(
        err,
        DownloadError::Upstream { status: Some(401), .. }
    ));
}

#[tokio::test]
async fn test_basic_challenge() {
    let graph = Graph::new();
    let (addr, _registry) = serve(Auth::Basic, &graph, |_| {}).await;

    let items = downloader(&addr, ":latest", Some(basic()))
        .download()
        .await
        .unwrap();
    assert_eq!(items.len(), 6);

    let err = downloader(&addr, ":latest", None).download().await.err().unwrap();
    assert!(matches!(err, DownloadError::Upstream { status: Some(401), .. }));
}

#[tokio::test]
async fn test_missing_layer_fails_whole_download() {
    let graph = Graph::new();
    let missing = Digest::of_bytes(&graph.layers[1]).to_string();
    let (addr, _registry) = serve(Auth::Anonymous, &graph, |r| {
        r.blobs.remove(&missing);
    })
    .await;

    let err = downloader(&addr, ":latest", None).download().await.err().unwrap();
    assert!(matches!(
        err,
        DownloadError::Upstream { status: Some(404), ref origin, .. } if *origin == missing
    ));
}

#[tokio::test]
async fn test_tampered_manifest_is_integrity_error() {
    let graph = Graph::new();
    let target = Digest::of_bytes(&graph.manifests[0]).to_string();
    let (addr, _registry) = serve(Auth::Anonymous, &graph, |r| {
        let tampered = br#"{"schemaVersion":2,"layers":[]}"#.to_vec();
        r.manifests.insert(target.clone(), (OCI_IMAGE_MANIFEST, tampered));
    })
    .await;

    let err = downloader(&addr, ":latest", None).download().await.err().unwrap();
    assert!(matches!(err, DownloadError::GraphIntegrity { .. }));
}

#[tokio::test]
async fn test_disagreeing_digest_header_is_rejected() {
    let graph = Graph::new();
    let (addr, _registry) = serve(Auth::Anonymous, &graph, |r| {
        r.digest_header = Some(Digest::of_bytes(b"something else").to_string());
    })
    .await;

    let err = downloader(&addr, ":latest", None).download().await.err().unwrap();
    assert!(matches!(err, DownloadError::GraphIntegrity { .. }));
}

#[tokio::test]
async fn test_unknown_tag_is_not_found() {
    let graph = Graph::new();
    let (addr, _registry) = serve(Auth::Anonymous, &graph, |_| {}).await;

    let err = downloader(&addr, ":nope", None).download().await.err().unwrap();
    assert!(matches!(err, DownloadError::Upstream { status: Some(404), .. }));
}
