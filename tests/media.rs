use storefront_api::media::{
    AssetKind, Dimensions, MediaStore, fit_within, plan_resize, public_url, public_url_opt,
    validate_upload,
};

#[test]
fn never_upscales() {
    assert_eq!(
        fit_within(800, 600, 1600, 1600),
        Dimensions {
            width: 800,
            height: 600
        }
    );
}

#[test]
fn keeps_aspect_ratio() {
    let d = fit_within(4000, 3000, 1600, 1600);
    assert_eq!((d.width, d.height), (1600, 1200));

    let d = fit_within(3000, 3000, 1920, 800);
    assert_eq!((d.width, d.height), (800, 800));

    let d = fit_within(10_000, 10, 1600, 1600);
    assert_eq!(d.width, 1600);
    assert!(d.height >= 1);
}

#[test]
fn product_images_get_a_thumbnail() {
    let plan = plan_resize(AssetKind::ProductImage, 3200, 2400).unwrap();
    assert!(plan.needs_resize);
    assert_eq!((plan.target.width, plan.target.height), (1600, 1200));
    let thumb = plan.thumbnail.expect("thumbnail");
    assert_eq!((thumb.width, thumb.height), (400, 300));

    let plan = plan_resize(AssetKind::Banner, 1200, 400).unwrap();
    assert!(!plan.needs_resize);
    assert!(plan.thumbnail.is_none());
}

#[test]
fn zero_dimensions_are_field_errors() {
    let errors = plan_resize(AssetKind::BrandLogo, 0, 0).unwrap_err();
    assert!(errors.contains("width"));
    assert!(errors.contains("height"));
}

#[test]
fn uploads_are_checked_against_their_kind() {
    assert_eq!(
        validate_upload(AssetKind::BrandLogo, "image/png", 10_000, 512, 512),
        Ok("png")
    );
    assert_eq!(
        validate_upload(AssetKind::ProductImage, "image/jpeg; charset=binary", 1, 10, 10),
        Ok("jpg")
    );

    let errors = validate_upload(AssetKind::BrandLogo, "image/gif", 10, 100, 100).unwrap_err();
    assert!(errors.contains("file"));

    let errors =
        validate_upload(AssetKind::BrandLogo, "image/png", 2 * 1024 * 1024, 100, 100).unwrap_err();
    assert!(errors.contains("file"));

    let errors = validate_upload(AssetKind::Banner, "image/webp", 100, 1920, 801).unwrap_err();
    assert!(errors.contains("height"));
    assert!(!errors.contains("width"));
}

#[test]
fn public_urls() {
    assert_eq!(
        public_url("http://localhost:3000/", "/product-images/a.png"),
        "http://localhost:3000/media/product-images/a.png"
    );
    assert_eq!(
        public_url("http://localhost:3000", "https://cdn.example.com/a.png"),
        "https://cdn.example.com/a.png"
    );
    assert_eq!(public_url_opt("http://localhost:3000", Some("  ")), None);
}

#[tokio::test]
async fn store_saves_and_removes_files() {
    let root = std::env::temp_dir().join(format!("storefront-media-{}", uuid::Uuid::new_v4()));
    let store = MediaStore::new(&root, "http://localhost:3000");

    let stored = store
        .save(AssetKind::CategoryImage, "png", b"not really a png")
        .await
        .unwrap();
    assert!(stored.key.starts_with("category-images/"));
    assert!(stored.key.ends_with(".png"));
    assert_eq!(stored.url, format!("http://localhost:3000/media/{}", stored.key));
    assert!(root.join(&stored.key).exists());

    store.remove(&stored.key).await.unwrap();
    assert!(!root.join(&stored.key).exists());
    store.remove(&stored.key).await.unwrap();
    store.remove("../etc/passwd").await.unwrap();

    tokio::fs::remove_dir_all(&root).await.ok();
}
