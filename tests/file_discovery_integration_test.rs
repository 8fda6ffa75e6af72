mod common;

use std::path::PathBuf;

use common::{TestFixtures, temp_tree};
use webspace_config::{FileDiscovery, WebspaceError};

fn relative(files: &[PathBuf], root: &std::path::Path) -> Vec<String> {
    files
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[tokio::test]
async fn test_discover_fixture_tree() {
    let fixtures = TestFixtures::new();
    let root = fixtures.webspaces_dir();

    let files = FileDiscovery::new().discover_files(&root).await.unwrap();

    assert_eq!(
        relative(&files, &root),
        vec![
            "invalid/missing_key.xml",
            "invalid/not_well_formed.xml",
            "invalid/url_without_segment.xml",
            "invalid/wrong_namespace.xml",
            "valid/blog.xml",
            "valid/sulu.io.xml",
        ]
    );
}

#[tokio::test]
async fn test_exclude_and_include_on_fixture_tree() {
    let fixtures = TestFixtures::new();
    let root = fixtures.webspaces_dir();

    let valid_only = FileDiscovery::new()
        .with_exclude_patterns(vec!["**/invalid/**".to_string()])
        .unwrap()
        .discover_files(&root)
        .await
        .unwrap();
    assert_eq!(relative(&valid_only, &root), vec!["valid/blog.xml", "valid/sulu.io.xml"]);

    let sulu_only = FileDiscovery::new()
        .with_include_patterns(vec!["**/sulu*.xml".to_string()])
        .unwrap()
        .discover_files(&root)
        .await
        .unwrap();
    assert_eq!(relative(&sulu_only, &root), vec!["valid/sulu.io.xml"]);
}

#[tokio::test]
async fn test_top_level_only() {
    let fixtures = TestFixtures::new();

    let files = FileDiscovery::new()
        .with_max_depth(Some(0))
        .discover_files(&fixtures.webspaces_dir())
        .await
        .unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_additional_extensions() {
    let temp_dir = temp_tree(&[
        ("sulu.xml", "<webspace/>"),
        ("sulu.xml.dist", "<webspace/>"),
        ("notes.txt", "not a webspace"),
    ]);

    let default = FileDiscovery::new()
        .discover_files(temp_dir.path())
        .await
        .unwrap();
    assert_eq!(relative(&default, temp_dir.path()), vec!["sulu.xml"]);

    let with_dist = FileDiscovery::new()
        .with_extensions(vec!["xml".to_string(), ".dist".to_string()])
        .discover_files(temp_dir.path())
        .await
        .unwrap();
    assert_eq!(
        relative(&with_dist, temp_dir.path()),
        vec!["sulu.xml", "sulu.xml.dist"]
    );
}

#[test]
fn test_invalid_pattern_is_reported() {
    let err = FileDiscovery::new()
        .with_include_patterns(vec!["[unclosed".to_string()])
        .unwrap_err();
    assert!(matches!(err, WebspaceError::Config(_)));
}
