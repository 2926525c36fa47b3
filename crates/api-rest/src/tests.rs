use super::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "catalog-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    Image(&'a str, &'a [u8]),
}

struct Fixture {
    _dir: TempDir,
    state: AppState,
}

impl Fixture {
    fn new() -> Self {
        Self::with_limits(1024 * 1024, 4)
    }

    fn with_limits(max_file_size: u64, max_files: usize) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let cfg = CoreConfig::new(
            dir.path().join("data"),
            dir.path().join("uploads"),
            max_file_size,
            max_files,
        )
        .expect("config");
        let state = AppState::new(Arc::new(cfg)).expect("state");
        Self { _dir: dir, state }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = router(self.state.clone()).oneshot(req).await.expect("response");
        let status = res.status();
        let bytes = res.into_body().collect().await.expect("body").to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn create(&self, name: &str, images: &[&str]) -> Value {
        let mut parts = vec![
            Part::Text("productName", name),
            Part::Text("price", "19.99"),
            Part::Text("quantity", "5"),
        ];
        parts.extend(images.iter().map(|content| Part::Image("image/png", content.as_bytes())));

        let (status, body) = self.send(multipart("POST", "/product", &parts)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    fn stored_files(&self) -> usize {
        self.state.service.files().list().expect("list uploads").len()
    }
}

fn multipart(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::Image(mimetype, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"images\"; filename=\"f{i}\"\r\nContent-Type: {mimetype}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn image_paths(product: &Value) -> Vec<String> {
    product["images"]
        .as_array()
        .expect("images array")
        .iter()
        .map(|v| v.as_str().expect("path").to_string())
        .collect()
}

fn contents(path: &str) -> Vec<u8> {
    std::fs::read(path).expect("image file")
}

#[tokio::test]
async fn test_health_and_openapi() {
    let fx = Fixture::new();

    let (status, body) = fx.send(empty("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = fx.send(empty("GET", "/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/product/{id}/images/indexes").is_some());
}

#[tokio::test]
async fn test_create_and_get_product() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["first", "second"]).await;

    let images = image_paths(&product);
    assert_eq!(images.len(), 2);
    assert_eq!(contents(&images[0]), b"first");
    assert_eq!(contents(&images[1]), b"second");
    assert_eq!(product["productName"], "Desk Lamp");
    assert_eq!(product["quantity"], 5);

    let id = product["id"].as_str().unwrap();
    let (status, body) = fx.send(empty("GET", &format!("/product/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product found");
    assert_eq!(body["data"]["images"], product["images"]);
}

#[tokio::test]
async fn test_create_duplicate_name_conflicts_and_discards_upload() {
    let fx = Fixture::new();
    fx.create("Desk Lamp", &["one"]).await;

    let (status, body) = fx
        .send(multipart(
            "POST",
            "/product",
            &[
                Part::Text("productName", "Desk Lamp"),
                Part::Text("price", "1"),
                Part::Text("quantity", "1"),
                Part::Image("image/png", b"two"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Desk Lamp already exist");
    assert_eq!(fx.stored_files(), 1);
}

#[tokio::test]
async fn test_create_rejects_non_image_and_cleans_up() {
    let fx = Fixture::new();

    let (status, body) = fx
        .send(multipart(
            "POST",
            "/product",
            &[
                Part::Text("productName", "Desk Lamp"),
                Part::Image("image/png", b"ok"),
                Part::Image("text/plain", b"not an image"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid file format, Only image files allowed");
    assert_eq!(fx.stored_files(), 0);
}

#[tokio::test]
async fn test_create_rejects_too_many_files() {
    let fx = Fixture::new();
    let mut parts = vec![Part::Text("productName", "Desk Lamp")];
    parts.extend((0..5).map(|_| Part::Image("image/png", b"x")));

    let (status, _) = fx.send(multipart("POST", "/product", &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fx.stored_files(), 0);
}

#[tokio::test]
async fn test_create_accepts_exactly_max_files() {
    let fx = Fixture::with_limits(16, 4);
    let product = fx.create("Desk Lamp", &["a", "b", "c", "d"]).await;

    assert_eq!(image_paths(&product).len(), 4);
    assert_eq!(fx.stored_files(), 4);
}

#[tokio::test]
async fn test_create_rejects_oversized_file_and_cleans_up() {
    let fx = Fixture::with_limits(16, 4);
    let oversized = [b'x'; 17];

    let (status, body) = fx
        .send(multipart(
            "POST",
            "/product",
            &[
                Part::Text("productName", "Desk Lamp"),
                Part::Text("price", "1"),
                Part::Text("quantity", "1"),
                Part::Image("image/png", b"fits"),
                Part::Image("image/png", &oversized),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("File too large"), "{body}");
    assert_eq!(fx.stored_files(), 0);

    let (_, body) = fx.send(empty("GET", "/product")).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_create_rejects_missing_fields() {
    let fx = Fixture::new();

    let (status, body) = fx
        .send(multipart(
            "POST",
            "/product",
            &[Part::Text("productName", "Desk Lamp"), Part::Image("image/png", b"x")],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("price"));
    assert_eq!(fx.stored_files(), 0);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let fx = Fixture::new();

    for id in ["0123456789abcdef0123456789abcdef", "not-an-id"] {
        let (status, body) = fx.send(empty("GET", &format!("/product/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found!");
    }
}

#[tokio::test]
async fn test_list_products() {
    let fx = Fixture::new();
    fx.create("Desk Lamp", &[]).await;
    fx.create("Floor Lamp", &[]).await;

    let (status, body) = fx.send(empty("GET", "/product")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All products available totalled: 2");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_fields_only_keeps_images() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["one"]).await;
    let id = product["id"].as_str().unwrap();

    let (status, body) = fx
        .send(json_request(
            "PUT",
            &format!("/product/{id}"),
            json!({ "price": 25, "description": "" }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product updated successfully");
    assert_eq!(body["data"]["price"], 25.0);
    assert_eq!(body["data"]["productName"], "Desk Lamp");
    assert_eq!(body["data"]["images"], product["images"]);
}

#[tokio::test]
async fn test_update_with_files_replaces_every_image() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["old0", "old1"]).await;
    let id = product["id"].as_str().unwrap();
    let old = image_paths(&product);

    let (status, body) = fx
        .send(multipart(
            "PUT",
            &format!("/product/{id}"),
            &[Part::Image("image/jpeg", b"new")],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let images = image_paths(&body["data"]);
    assert_eq!(images.len(), 1);
    assert_eq!(contents(&images[0]), b"new");
    assert!(old.iter().all(|path| !Path::new(path).exists()));
}

#[tokio::test]
async fn test_append_images_preserves_order() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0"]).await;
    let id = product["id"].as_str().unwrap();

    let (status, body) = fx
        .send(multipart(
            "PUT",
            &format!("/product/{id}/images"),
            &[Part::Image("image/png", b"n0"), Part::Image("image/png", b"n1")],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let images = image_paths(&body["data"]);
    let bytes: Vec<Vec<u8>> = images.iter().map(|p| contents(p)).collect();
    assert_eq!(bytes, vec![b"p0".to_vec(), b"n0".to_vec(), b"n1".to_vec()]);
}

#[tokio::test]
async fn test_replace_single_image() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0", "p1"]).await;
    let id = product["id"].as_str().unwrap();
    let old = image_paths(&product);

    let (status, body) = fx
        .send(multipart(
            "PUT",
            &format!("/product/{id}/images/1"),
            &[Part::Image("image/png", b"n")],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image replaced successfully");
    let images = image_paths(&body["data"]);
    assert_eq!(images.len(), 2);
    assert_eq!(images[0], old[0]);
    assert_eq!(contents(&images[1]), b"n");
    assert!(!Path::new(&old[1]).exists());
}

#[tokio::test]
async fn test_replace_single_image_rejects_bad_index() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0"]).await;
    let id = product["id"].as_str().unwrap();

    for index in ["1", "-1", "abc"] {
        let (status, body) = fx
            .send(multipart(
                "PUT",
                &format!("/product/{id}/images/{index}"),
                &[Part::Image("image/png", b"n")],
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "index {index}");
        assert_eq!(body["message"], "Invalid image index!");
    }
    assert_eq!(fx.stored_files(), 1);
}

#[tokio::test]
async fn test_replace_single_image_accepts_one_file_only() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0"]).await;
    let id = product["id"].as_str().unwrap();

    let (status, _) = fx
        .send(multipart(
            "PUT",
            &format!("/product/{id}/images/0"),
            &[Part::Image("image/png", b"a"), Part::Image("image/png", b"b")],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fx.stored_files(), 1);
}

#[tokio::test]
async fn test_replace_images_by_indexes() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0", "p1", "p2"]).await;
    let id = product["id"].as_str().unwrap();
    let old = image_paths(&product);

    let (status, body) = fx
        .send(multipart(
            "PUT",
            &format!("/product/{id}/images/indexes"),
            &[
                Part::Text("indexes", "2,0"),
                Part::Image("image/png", b"fa"),
                Part::Image("image/png", b"fb"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Selected images replaced successfully");

    let images = image_paths(&body["data"]);
    let bytes: Vec<Vec<u8>> = images.iter().map(|p| contents(p)).collect();
    assert_eq!(bytes, vec![b"fb".to_vec(), b"p1".to_vec(), b"fa".to_vec()]);
    assert!(!Path::new(&old[0]).exists());
    assert!(!Path::new(&old[2]).exists());
    assert_eq!(body["replacements"][0]["applied"], true);
    assert_eq!(body["replacements"][0]["replaced"], old[2].as_str());
}

#[tokio::test]
async fn test_replace_images_skips_out_of_range_pairs() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0"]).await;
    let id = product["id"].as_str().unwrap();

    let (status, body) = fx
        .send(multipart(
            "PUT",
            &format!("/product/{id}/images/indexes"),
            &[
                Part::Text("indexes", "[5, 0]"),
                Part::Image("image/png", b"fa"),
                Part::Image("image/png", b"fb"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["replacements"][0]["applied"], false);
    assert_eq!(body["replacements"][1]["applied"], true);
    let images = image_paths(&body["data"]);
    assert_eq!(contents(&images[0]), b"fb");
    assert_eq!(fx.stored_files(), 1);
}

#[tokio::test]
async fn test_replace_images_count_mismatch() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0", "p1"]).await;
    let id = product["id"].as_str().unwrap();

    for parts in [
        vec![Part::Text("indexes", "0,1"), Part::Image("image/png", b"fa")],
        vec![Part::Image("image/png", b"fa")],
    ] {
        let (status, body) = fx
            .send(multipart(
                "PUT",
                &format!("/product/{id}/images/indexes"),
                &parts,
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Indexes count must match uploaded files count"
        );
    }

    let (_, body) = fx.send(empty("GET", &format!("/product/{id}"))).await;
    assert_eq!(body["data"]["images"], product["images"]);
    assert_eq!(fx.stored_files(), 2);
}

#[tokio::test]
async fn test_delete_image_shifts_list() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0", "p1"]).await;
    let id = product["id"].as_str().unwrap();
    let old = image_paths(&product);

    let (status, body) = fx
        .send(empty("DELETE", &format!("/product/{id}/images/0")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image deleted successfully");
    assert_eq!(image_paths(&body["data"]), vec![old[1].clone()]);
    assert!(!Path::new(&old[0]).exists());

    let (status, body) = fx
        .send(empty("DELETE", &format!("/product/{id}/images/1")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid image index!");
}

#[tokio::test]
async fn test_delete_product_removes_files() {
    let fx = Fixture::new();
    let product = fx.create("Desk Lamp", &["p0", "p1"]).await;
    let id = product["id"].as_str().unwrap();

    let (status, body) = fx.send(empty("DELETE", &format!("/product/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");
    assert_eq!(fx.stored_files(), 0);

    let (status, _) = fx.send(empty("GET", &format!("/product/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = fx.send(empty("DELETE", &format!("/product/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
