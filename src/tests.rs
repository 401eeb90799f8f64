use std::io::Cursor;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use poem::http::StatusCode;
use poem::test::TestClient;
use poem::Route;
use serde_json::Value;

use crate::config::VariantPresets;
use crate::processor::VariantGenerator;
use crate::routes;
use crate::storage::backends::memory::{MemoryCacheStore, MemoryObjectStore, MemoryTableStore};
use crate::storage::template::{CacheStore, ObjectStore, TableStore};
use crate::writethrough::WriteThroughStore;

const BOUNDARY: &str = "vitrine-test-boundary";

struct TestEnv {
    client: TestClient<Route>,
    tables: Arc<MemoryTableStore>,
    cache: Arc<MemoryCacheStore>,
    objects: Arc<MemoryObjectStore>,
}

fn setup() -> TestEnv {
    let tables = Arc::new(MemoryTableStore::default());
    let cache = Arc::new(MemoryCacheStore::default());
    let objects = Arc::new(MemoryObjectStore::default());

    let store = WriteThroughStore::new(tables.clone(), cache.clone());
    let images = VariantGenerator::new(objects.clone(), VariantPresets::default());
    let app = routes::build_route(store, images);

    TestEnv {
        client: TestClient::new(app),
        tables,
        cache,
        objects,
    }
}

fn test_png() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        16,
        16,
        image::Rgb([120, 40, 200]),
    ));
    let mut buff = Cursor::new(Vec::new());
    img.write_to(&mut buff, image::ImageFormat::Png)
        .expect("failed to encode test image");
    buff.into_inner()
}

fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some(data) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                name=\"image\"; filename=\"upload.png\"\r\n\
                Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn form_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

const SHIRT_FIELDS: &[(&str, &str)] = &[
    ("category", "tops"),
    ("desc", "a casual shirt"),
    ("name", "Shirt"),
    ("newPrice", "500"),
    ("oldPrice", ""),
    ("quantity", "3"),
    ("season", "summer"),
    ("type", "casual"),
];

async fn create_shirt(env: &TestEnv) -> String {
    let res = env
        .client
        .post("/products")
        .body(multipart_body(SHIRT_FIELDS, Some(&test_png())))
        .content_type(form_content_type())
        .send()
        .await;

    res.assert_status(StatusCode::OK);
    let body = res.json().await;
    body.value().object().get("id").string().to_string()
}

async fn stored_record(env: &TestEnv, table: &str, id: &str) -> Value {
    let raw = env
        .tables
        .get(table, id)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("no {} record stored for {}", table, id));
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn create_product_coerces_fields_and_uploads_variants() {
    let env = setup();
    let id = create_shirt(&env).await;

    let stored = stored_record(&env, "products", &id).await;
    assert_eq!(stored["new_price"], serde_json::json!(500.0));
    assert_eq!(stored["old_price"], Value::Null);
    assert_eq!(stored["quantity"], serde_json::json!(3));
    assert_eq!(stored["type"], "casual");
    assert!(stored["createdAt"].is_i64());

    let image = stored["image"].as_object().unwrap();
    assert_eq!(image.len(), 3);
    for variant in ["thumbnail", "medium", "original"] {
        let key = format!("{}/{}.jpg", id, variant);
        assert_eq!(image[variant], format!("memory://{}", key));
        assert!(env.objects.fetch(&key).await.unwrap().is_some());
    }

    // The cache mirrors the canonical serialized record.
    let cached = env.cache.get(&format!("product:{}", id)).await.unwrap().unwrap();
    assert_eq!(serde_json::from_str::<Value>(&cached).unwrap(), stored);
}

#[tokio::test]
async fn create_product_without_an_image_is_a_client_error() {
    let env = setup();

    let res = env
        .client
        .post("/products")
        .body(multipart_body(SHIRT_FIELDS, None))
        .content_type(form_content_type())
        .send()
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);
    assert!(env.tables.scan("products").await.unwrap().is_empty());
}

#[tokio::test]
async fn create_product_with_a_bad_number_writes_nothing() {
    let env = setup();

    let fields: Vec<(&str, &str)> = SHIRT_FIELDS
        .iter()
        .map(|&(k, v)| if k == "quantity" { (k, "three") } else { (k, v) })
        .collect();

    let res = env
        .client
        .post("/products")
        .body(multipart_body(&fields, Some(&test_png())))
        .content_type(form_content_type())
        .send()
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);
    assert!(env.tables.scan("products").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_preserves_the_image_and_creation_time() {
    let env = setup();
    let id = create_shirt(&env).await;

    let before = stored_record(&env, "products", &id).await;

    let fields: Vec<(&str, &str)> = [
        ("category", "tops"),
        ("desc", "a casual shirt"),
        ("name", "Shirt"),
        ("new_price", "500"),
        ("old_price", ""),
        ("quantity", "5"),
        ("season", "summer"),
        ("type", "casual"),
    ]
    .to_vec();

    let res = env
        .client
        .put(format!("/products/{}", id))
        .body(multipart_body(&fields, None))
        .content_type(form_content_type())
        .send()
        .await;

    res.assert_status(StatusCode::OK);

    let after = stored_record(&env, "products", &id).await;
    assert_eq!(after["quantity"], serde_json::json!(5));
    assert_eq!(after["image"], before["image"]);
    assert_eq!(after["createdAt"], before["createdAt"]);
    assert!(after["updatedAt"].is_i64());

    let cached = env.cache.get(&format!("product:{}", id)).await.unwrap().unwrap();
    assert_eq!(serde_json::from_str::<Value>(&cached).unwrap(), after);
}

#[tokio::test]
async fn update_of_an_unknown_id_is_not_found() {
    let env = setup();

    let fields = [
        ("category", "tops"),
        ("desc", "a casual shirt"),
        ("name", "Shirt"),
        ("new_price", "500"),
        ("quantity", "5"),
        ("season", "summer"),
        ("type", "casual"),
    ];

    let res = env
        .client
        .put("/products/does-not-exist")
        .body(multipart_body(&fields, None))
        .content_type(form_content_type())
        .send()
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_banner_disappears_from_the_listing() {
    let env = setup();

    let res = env
        .client
        .post("/banners")
        .body(multipart_body(&[("name", "Summer Sale")], Some(&test_png())))
        .content_type(form_content_type())
        .send()
        .await;
    res.assert_status(StatusCode::OK);
    let body = res.json().await;
    let id = body.value().object().get("id").string().to_string();

    let res = env.client.delete(format!("/banners/{}", id)).send().await;
    res.assert_status(StatusCode::NO_CONTENT);

    assert!(env.tables.get("banners", &id).await.unwrap().is_none());
    assert!(env
        .cache
        .get(&format!("banner:{}", id))
        .await
        .unwrap()
        .is_none());

    let res = env.client.get("/banners").send().await;
    res.assert_status(StatusCode::OK);
    let body = res.json().await;
    assert_eq!(body.value().object().get("banners").array().len(), 0);
}

#[tokio::test]
async fn banner_creation_defaults_to_active() {
    let env = setup();

    let res = env
        .client
        .post("/banners")
        .body(multipart_body(&[("name", "Summer Sale")], Some(&test_png())))
        .content_type(form_content_type())
        .send()
        .await;
    res.assert_status(StatusCode::OK);
    let body = res.json().await;
    let id = body.value().object().get("id").string().to_string();

    let stored = stored_record(&env, "banners", &id).await;
    assert_eq!(stored["isActive"], serde_json::json!(true));
    assert_eq!(stored["name"], "Summer Sale");
}

#[tokio::test]
async fn category_listing_returns_every_record() {
    let env = setup();

    for name in ["Shirts", "Shoes"] {
        let res = env
            .client
            .post("/categories")
            .body(multipart_body(
                &[("name", name), ("priority", "2")],
                Some(&test_png()),
            ))
            .content_type(form_content_type())
            .send()
            .await;
        res.assert_status(StatusCode::OK);
    }

    let res = env.client.get("/categories").send().await;
    res.assert_status(StatusCode::OK);
    let body = res.json().await;
    assert_eq!(body.value().object().get("categories").array().len(), 2);
}

struct FailingTableStore;

#[async_trait]
impl TableStore for FailingTableStore {
    async fn put(&self, _table: &str, _id: &str, _record: String) -> anyhow::Result<()> {
        Err(anyhow!("table store offline"))
    }

    async fn get(&self, _table: &str, _id: &str) -> anyhow::Result<Option<String>> {
        Err(anyhow!("table store offline"))
    }

    async fn scan(&self, _table: &str) -> anyhow::Result<Vec<String>> {
        Err(anyhow!("table store offline"))
    }

    async fn delete(&self, _table: &str, _id: &str) -> anyhow::Result<()> {
        Err(anyhow!("table store offline"))
    }
}

#[tokio::test]
async fn listing_surfaces_store_failures_as_500() {
    let store = WriteThroughStore::new(
        Arc::new(FailingTableStore),
        Arc::new(MemoryCacheStore::default()),
    );
    let images = VariantGenerator::new(
        Arc::new(MemoryObjectStore::default()),
        VariantPresets::default(),
    );
    let client = TestClient::new(routes::build_route(store, images));

    let res = client.get("/products").send().await;
    res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}
