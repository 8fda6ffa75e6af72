mod common;

use std::path::PathBuf;

use common::{TestFixtures, temp_tree, webspace_xml};
use rayon::prelude::*;
use webspace_config::{FileLocator, WebspaceError, WebspaceSchema, XmlFileLoader};

fn loader() -> XmlFileLoader {
    XmlFileLoader::new(FileLocator::new())
}

#[test]
fn test_load_full_webspace() {
    let fixtures = TestFixtures::new();
    let webspace = loader().load(fixtures.sulu_io()).unwrap();

    assert_eq!(webspace.name(), "Sulu CMF");
    assert_eq!(webspace.key(), "sulu_io");
    assert_eq!(webspace.theme().key(), "sulu");
    assert!(webspace.theme().is_excluded("overview"));

    let localizations = webspace.localizations();
    assert_eq!(localizations.root_count(), 2);
    assert_eq!(
        localizations.codes("_"),
        vec!["en", "en_us", "en_ca", "de", "de_at", "de_ch"]
    );
    let en_us = localizations.find("en", Some("us")).unwrap();
    assert_eq!(localizations.depth(en_us.id()), 1);
    assert_eq!(localizations.parent_of(en_us.id()).unwrap().code("_"), "en");
    assert_eq!(en_us.shadow(), Some("auto"));

    let segment_keys: Vec<&str> = webspace.segments().iter().map(|s| s.key()).collect();
    assert_eq!(segment_keys, vec!["w", "s"]);

    assert_eq!(webspace.portals().len(), 2);
}

#[test]
fn test_portal_own_and_inherited_localizations() {
    let webspace = loader().load(TestFixtures::new().sulu_io()).unwrap();

    let own = webspace.portal("sulucmf_at").unwrap().localizations();
    assert_eq!(own.codes("_"), vec!["de_at", "en_us"]);
    assert!(own.find("de", Some("ch")).is_none());

    let inherited = webspace.portal("sulucmf").unwrap().localizations();
    assert_eq!(inherited.root_count(), webspace.localizations().len());
    assert_eq!(inherited.codes("_"), webspace.localizations().codes("_"));
    assert!(inherited.iter().all(|l| !l.has_children() && l.parent().is_none()));
}

#[test]
fn test_environments_and_urls() {
    let webspace = loader().load(TestFixtures::new().sulu_io()).unwrap();
    let portal = webspace.portal("sulucmf_at").unwrap();

    let kinds: Vec<&str> = portal.environments().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec!["prod", "dev"]);

    let prod = portal.environment("prod").unwrap().urls();
    assert_eq!(prod[0].url(), "sulu.at");
    assert_eq!(prod[0].language(), Some("de"));
    assert_eq!(prod[0].country(), Some("at"));
    assert_eq!(prod[0].segment(), Some("w"));
    assert!(prod[1].is_redirect());
    assert_eq!(prod[1].redirect(), Some("sulu.at"));

    let dev = portal.environment("dev").unwrap().urls();
    assert_eq!(dev[0].url(), "{localization}.{segment}.sulu.lo");
}

#[test]
fn test_single_localization_scenario() {
    let webspace = loader().load(TestFixtures::new().blog()).unwrap();

    assert_eq!(webspace.key(), "sulu_blog");
    assert_eq!(webspace.localizations().codes("_"), vec!["de_AT"]);

    let portal = &webspace.portals()[0];
    assert_eq!(portal.environments().len(), 1);
    assert_eq!(portal.environments()[0].kind(), "prod");
    assert_eq!(portal.environments()[0].urls().len(), 1);
    assert_eq!(portal.environments()[0].urls()[0].url(), "{localization}");
}

#[test]
fn test_document_with_doctype_loads_with_schema_validation() {
    let content = std::fs::read_to_string(TestFixtures::new().blog())
        .unwrap()
        .replacen("?>", "?>\n<!DOCTYPE webspace>", 1);
    let temp_dir = temp_tree(&[("doctype.xml", &content)]);

    let webspace = loader().load(temp_dir.path().join("doctype.xml")).unwrap();
    assert_eq!(webspace.key(), "sulu_blog");
    assert_eq!(webspace.portals()[0].localizations().codes("_"), vec!["de_AT"]);
}

#[test]
fn test_search_paths() {
    let fixtures = TestFixtures::new();
    let loader = XmlFileLoader::new(FileLocator::with_search_paths(vec![
        fixtures.invalid_dir(),
        fixtures.valid_dir(),
    ]));

    let webspace = loader.load("blog.xml").unwrap();
    assert_eq!(webspace.key(), "sulu_blog");

    match loader.load("unknown.xml").unwrap_err() {
        WebspaceError::ResourceNotFound { searched, .. } => {
            assert_eq!(searched.len(), 3);
            assert_eq!(searched[2], fixtures.valid_dir().join("unknown.xml"));
        }
        other => panic!("Expected ResourceNotFound, got {:?}", other),
    }
}

#[test]
fn test_unsupported_extension() {
    let err = loader().load("webspace.json").unwrap_err();
    assert!(matches!(err, WebspaceError::UnsupportedResource { .. }));
}

#[test]
fn test_missing_key_fails_with_and_without_schema() {
    let path = TestFixtures::new().missing_key();

    let err = loader().load(&path).unwrap_err();
    assert!(matches!(err, WebspaceError::ConfigFormat { .. }));

    let err = loader().with_schema_validation(false).load(&path).unwrap_err();
    match err {
        WebspaceError::ConfigFormat { path: reported, details } => {
            assert_eq!(reported, path);
            assert!(details.contains("<key>"));
        }
        other => panic!("Expected ConfigFormat, got {:?}", other),
    }
}

#[test]
fn test_url_without_segment_is_invalid_definition() {
    let err = loader()
        .load(TestFixtures::new().url_without_segment())
        .unwrap_err();

    match err {
        WebspaceError::InvalidUrlDefinition { webspace, url } => {
            assert_eq!(webspace, "segmented");
            assert_eq!(url, "{language}.{country}.segmented.io");
        }
        other => panic!("Expected InvalidUrlDefinition, got {:?}", other),
    }
}

#[test]
fn test_malformed_and_foreign_documents() {
    let fixtures = TestFixtures::new();

    for path in [fixtures.not_well_formed(), fixtures.wrong_namespace()] {
        for validate in [true, false] {
            let err = loader()
                .with_schema_validation(validate)
                .load(&path)
                .unwrap_err();
            assert!(
                matches!(err, WebspaceError::ConfigFormat { .. }),
                "{} (schema validation {}): {:?}",
                path.display(),
                validate,
                err
            );
        }
    }
}

#[test]
fn test_fixtures_against_bundled_schema() {
    let fixtures = TestFixtures::new();
    let schema = WebspaceSchema::load().unwrap();

    schema.validate(&fixtures.sulu_io()).unwrap();
    schema.validate(&fixtures.blog()).unwrap();
    // structurally valid, rejected only by the url check
    schema.validate(&fixtures.url_without_segment()).unwrap();

    assert!(schema.validate(&fixtures.missing_key()).is_err());
}

#[test]
fn test_concurrent_loads_are_equal() {
    let path = TestFixtures::new().sulu_io();
    let loader = loader();
    let expected = loader.load(&path).unwrap();

    let loaded: Vec<_> = (0..32)
        .into_par_iter()
        .map(|_| loader.load(&path).unwrap())
        .collect();

    assert!(loaded.iter().all(|webspace| *webspace == expected));
}

#[test]
fn test_concurrent_loads_of_different_files() {
    let files: Vec<(String, String)> = (0..16)
        .map(|i| {
            (
                format!("webspace_{i}.xml"),
                webspace_xml(&format!("webspace_{i}"), "{localization}.example.com"),
            )
        })
        .collect();
    let borrowed: Vec<(&str, &str)> = files
        .iter()
        .map(|(name, content)| (name.as_str(), content.as_str()))
        .collect();
    let temp_dir = temp_tree(&borrowed);

    let loader = XmlFileLoader::new(FileLocator::with_search_paths(vec![
        temp_dir.path().to_path_buf(),
    ]));

    let keys: Vec<String> = (0..16)
        .into_par_iter()
        .map(|i| {
            loader
                .load(PathBuf::from(format!("webspace_{i}.xml")))
                .unwrap()
                .key()
                .to_string()
        })
        .collect();

    for (i, key) in keys.iter().enumerate() {
        assert_eq!(key, &format!("webspace_{i}"));
    }
}

#[test]
fn test_serialized_webspace_shape() {
    let webspace = loader().load(TestFixtures::new().sulu_io()).unwrap();
    let json = serde_json::to_value(&webspace).unwrap();

    assert_eq!(json["key"], "sulu_io");
    assert_eq!(json["localizations"][0]["language"], "en");
    assert_eq!(json["localizations"][0]["children"][0]["country"], "us");
    assert_eq!(json["segments"][1]["name"], "Summer");
    assert_eq!(json["portals"][0]["environments"][0]["type"], "prod");
}
