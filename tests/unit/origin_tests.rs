// Origin service tests: edge rewrite feeding the origin, filesystem storage

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use hikari::config::{OriginConfig, StorageBackend, StorageConfig};
use hikari::constants::ORIGIN_SECRET_HEADER;
use hikari::edge::{EdgeRequest, QueryNormalizer};
use hikari::origin::{OriginEvent, OriginRequest, OriginService};
use hikari::storage::{build_stores, MemoryObjectStore, ObjectStore, Stores};

const SECRET: &str = "integration-secret";

fn origin_config() -> OriginConfig {
    OriginConfig {
        secret: SECRET.to_string(),
        secret_header: ORIGIN_SECRET_HEADER.to_string(),
    }
}

fn jpeg(width: u32, height: u32) -> Bytes {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageFormat::Jpeg)
        .unwrap();
    Bytes::from(buffer.into_inner())
}

#[tokio::test]
async fn test_edge_rewrite_feeds_origin() {
    let originals = MemoryObjectStore::new();
    let variants = MemoryObjectStore::new();
    originals.insert("photos/rio.jpeg", "image/jpeg", jpeg(400, 300));

    let service = OriginService::new(
        Stores {
            originals: Arc::new(originals),
            variants: Arc::new(variants.clone()),
        },
        &origin_config(),
    );

    let mut viewer_request = EdgeRequest::new("/photos/rio.jpeg")
        .with_query("Width", "200")
        .with_query("format", "auto")
        .with_query("quality", "60")
        .with_header("accept", "image/webp,*/*");
    QueryNormalizer::default().normalize(&mut viewer_request);
    assert_eq!(
        viewer_request.uri,
        "/photos/rio.jpeg/format=webp,quality=60,width=200"
    );

    let response = service
        .handle(
            OriginRequest::new("GET", viewer_request.uri.clone())
                .with_header(ORIGIN_SECRET_HEADER, SECRET),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "image/webp");

    let decoded = image::load_from_memory(&response.body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 150));

    let stored = variants
        .get("photos/rio.jpeg/format=webp,quality=60,width=200")
        .expect("variant persisted under the canonical path");
    assert_eq!(stored.body, response.body);
}

#[tokio::test]
async fn test_filesystem_backend_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        backend: StorageBackend::Filesystem,
        root: Some(dir.path().to_string_lossy().into_owned()),
        original_bucket: "src".to_string(),
        variant_bucket: "out".to_string(),
        ..StorageConfig::default()
    };

    let stores = build_stores(&config).await.unwrap();
    stores
        .originals
        .put_object("cat.jpeg", "image/jpeg", jpeg(64, 64))
        .await
        .unwrap();

    let service = OriginService::new(stores.clone(), &origin_config());
    let response = service
        .handle(
            OriginRequest::new("GET", "/cat.jpeg/format=png,height=32,width=16")
                .with_header(ORIGIN_SECRET_HEADER, SECRET),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "image/png");
    assert!(dir
        .path()
        .join("out/cat.jpeg/format=png,height=32,width=16")
        .is_file());

    let variant = stores
        .variants
        .get_object("cat.jpeg/format=png,height=32,width=16")
        .await
        .unwrap();
    let decoded = image::load_from_memory(&variant).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 32));
}

#[tokio::test]
async fn test_event_adapter_end_to_end() {
    let originals = MemoryObjectStore::new();
    originals.insert("a.jpeg", "image/jpeg", jpeg(32, 32));
    let service = OriginService::new(
        Stores {
            originals: Arc::new(originals),
            variants: Arc::new(MemoryObjectStore::new()),
        },
        &origin_config(),
    );

    let json = format!(
        r#"{{
            "headers": {{"x-origin-secret-header": "{}"}},
            "requestContext": {{"http": {{"method": "GET", "path": "/a.jpeg/format=jpeg,width=16"}}}}
        }}"#,
        SECRET
    );
    let event = OriginEvent::from_json(&json).unwrap();

    let response = service.handle(event.into_request()).await.into_event_response();

    assert_eq!(response.status_code, 200);
    assert!(response.is_base64_encoded);
    assert!(response.body.starts_with("/9j/"));
    assert_eq!(response.headers["Content-Type"], "image/jpeg");
}

#[tokio::test]
async fn test_event_without_secret_is_rejected() {
    let service = OriginService::new(
        Stores {
            originals: Arc::new(MemoryObjectStore::new()),
            variants: Arc::new(MemoryObjectStore::new()),
        },
        &origin_config(),
    );

    let event = OriginEvent::from_json(
        r#"{"requestContext": {"http": {"method": "GET", "path": "/a.jpeg/format=png"}}}"#,
    )
    .unwrap();

    let response = service.handle(event.into_request()).await.into_event_response();
    assert_eq!(response.status_code, 401);
    assert!(!response.is_base64_encoded);
    assert_eq!(response.body, "Unauthorized");
}

#[tokio::test]
async fn test_operation_path_without_query_is_bounded_at_origin() {
    let originals = MemoryObjectStore::new();
    let variants = MemoryObjectStore::new();
    originals.insert("a.png", "image/png", jpeg(16, 16));
    let service = OriginService::new(
        Stores {
            originals: Arc::new(originals),
            variants: Arc::new(variants.clone()),
        },
        &origin_config(),
    );

    for uri in ["/a.png/width=5000", "/a.png/quality=500"] {
        // No query string, so the edge leaves the path alone
        let mut viewer_request = EdgeRequest::new(uri);
        QueryNormalizer::default().normalize(&mut viewer_request);
        assert_eq!(viewer_request.uri, uri);

        let response = service
            .handle(
                OriginRequest::new("GET", viewer_request.uri.clone())
                    .with_header(ORIGIN_SECRET_HEADER, SECRET),
            )
            .await;

        assert_eq!(response.status, 500, "{}", uri);
        assert!(!response.is_image);
    }

    assert!(variants.is_empty());
}
