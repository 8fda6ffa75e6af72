#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture paths
pub struct TestFixtures {
    pub fixtures_dir: PathBuf,
}

impl TestFixtures {
    pub fn new() -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures");

        Self { fixtures_dir }
    }

    pub fn webspaces_dir(&self) -> PathBuf {
        self.fixtures_dir.join("webspaces")
    }

    pub fn valid_dir(&self) -> PathBuf {
        self.webspaces_dir().join("valid")
    }

    pub fn invalid_dir(&self) -> PathBuf {
        self.webspaces_dir().join("invalid")
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.fixtures_dir.join("configs")
    }

    pub fn sulu_io(&self) -> PathBuf {
        self.valid_dir().join("sulu.io.xml")
    }

    pub fn blog(&self) -> PathBuf {
        self.valid_dir().join("blog.xml")
    }

    pub fn missing_key(&self) -> PathBuf {
        self.invalid_dir().join("missing_key.xml")
    }

    pub fn url_without_segment(&self) -> PathBuf {
        self.invalid_dir().join("url_without_segment.xml")
    }

    pub fn not_well_formed(&self) -> PathBuf {
        self.invalid_dir().join("not_well_formed.xml")
    }

    pub fn wrong_namespace(&self) -> PathBuf {
        self.invalid_dir().join("wrong_namespace.xml")
    }
}

/// Minimal webspace document with one portal and one url
pub fn webspace_xml(key: &str, url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<webspace xmlns="http://schemas.sulu.io/webspace/webspace">
    <name>{key}</name>
    <key>{key}</key>
    <localizations>
        <localization language="en"/>
    </localizations>
    <theme>
        <key>default</key>
    </theme>
    <portals>
        <portal>
            <name>{key}</name>
            <key>{key}</key>
            <resource-locator>
                <strategy>tree</strategy>
            </resource-locator>
            <environments>
                <environment type="prod">
                    <urls>
                        <url>{url}</url>
                    </urls>
                </environment>
            </environments>
        </portal>
    </portals>
</webspace>
"#
    )
}

/// Temporary directory containing the given `(relative path, content)` files
pub fn temp_tree(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (name, content) in files {
        write_file(temp_dir.path(), name, content);
    }
    temp_dir
}

pub fn write_file(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
