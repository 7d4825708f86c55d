use crate::LocalStore;
use tempfile::tempdir;

#[tokio::test]
async fn publish_and_read_round_trip() {
    let dir = tempdir().unwrap();
    let store = LocalStore::new(dir.path().join("optimized"));

    let size = store.publish("photo-compressed.jpeg", b"abc123").await.unwrap();
    assert_eq!(size, 6);

    let data = store.read("photo-compressed.jpeg").await.unwrap();
    assert_eq!(data, b"abc123");
}

#[tokio::test]
async fn publish_creates_the_directory_on_demand() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("nested").join("optimized");
    let store = LocalStore::new(base.clone());

    store.publish("a.png", b"x").await.unwrap();
    assert!(base.join("a.png").exists());
}

#[tokio::test]
async fn republishing_overwrites_instead_of_accumulating() {
    let dir = tempdir().unwrap();
    let store = LocalStore::new(dir.path().to_path_buf());

    store.publish("photo-resized.png", b"first").await.unwrap();
    store.publish("photo-resized.png", b"second-longer").await.unwrap();

    assert_eq!(store.read("photo-resized.png").await.unwrap(), b"second-longer");

    // Exactly one visible artifact, no temp siblings.
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["photo-resized.png".to_string()]);
}

#[tokio::test]
async fn path_traversal_names_are_rejected() {
    let dir = tempdir().unwrap();
    let store = LocalStore::new(dir.path().to_path_buf());

    for name in ["../escape.png", "a/b.png", "a\\b.png", ""] {
        assert!(store.publish(name, b"x").await.is_err(), "{name:?}");
    }
}

#[test]
fn url_path_is_request_relative() {
    let store = LocalStore::new("optimized".into());
    assert_eq!(store.url_path("photo-thumbnail.jpeg"), "/optimized/photo-thumbnail.jpeg");
}
