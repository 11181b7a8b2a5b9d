//! End-to-end builds over real directory trees.

use builder::{build_site, logging, BuildError, SiteConfig};
use preprocessor::ExpansionError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn full_site_build_from_config_file() {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("www/partials")).unwrap();
    fs::create_dir_all(root.join("www/img")).unwrap();
    fs::write(
        root.join("site.toml"),
        format!(
            "source_dir = \"{}\"\noutput_dir = \"{}\"\n",
            root.join("www").display(),
            root.join("public").display()
        ),
    )
    .unwrap();
    fs::write(
        root.join("www/partials/layout.html"),
        "#define page(title, body) (\n<html><head><title>{title}</title></head>\n<body>{body}</body></html>\n)\n",
    )
    .unwrap();
    fs::write(
        root.join("www/index.html"),
        "#include <partials/layout.html>\n#define SHOW_BANNER ( 1 )\n#ifdef SHOW_BANNER\npage(Home, <h1>Welcome</h1>)\n#endif\n",
    )
    .unwrap();
    fs::write(root.join("www/img/logo.svg"), "<svg/>").unwrap();

    let config = SiteConfig::from_file(&root.join("site.toml")).unwrap();
    let stats = build_site(&config).unwrap();

    // layout.html is itself a template; its define is consumed, so it
    // builds as an empty page.
    assert_eq!(stats.pages_built, 2);
    assert_eq!(stats.assets_copied, 1);
    assert!(stats.failures.is_empty());

    let index = fs::read_to_string(root.join("public/index.html")).unwrap();
    assert_eq!(
        index,
        "<html><head><title>Home</title></head>\n<body><h1>Welcome</h1></body></html>\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("public/img/logo.svg")).unwrap(),
        "<svg/>"
    );
}

#[test]
fn each_template_expands_in_a_fresh_scope() {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    let site = dir.path().join("site");
    fs::create_dir_all(&site).unwrap();
    fs::write(site.join("one.html"), "#define greet() ( Hi )\ngreet()\n").unwrap();
    fs::write(site.join("two.html"), "greet()\n").unwrap();

    let config = SiteConfig {
        source_dir: site,
        output_dir: dir.path().join("out"),
        ..SiteConfig::default()
    };
    let stats = build_site(&config).unwrap();
    assert_eq!(stats.pages_built, 2);

    let one = fs::read_to_string(dir.path().join("out/one.html")).unwrap();
    let two = fs::read_to_string(dir.path().join("out/two.html")).unwrap();
    assert_eq!(one, "Hi\n");
    // `greet` was defined by a different page; here it is just text.
    assert_eq!(two, "greet()\n");
}

#[test]
fn cyclic_partials_fail_one_page_and_copy_the_rest() {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    let site = dir.path().join("site");
    fs::create_dir_all(&site).unwrap();
    fs::write(site.join("page.html"), "#include <a.inc>\n").unwrap();
    fs::write(site.join("a.inc"), "#include <b.inc>\n").unwrap();
    fs::write(site.join("b.inc"), "#include <a.inc>\n").unwrap();
    fs::write(site.join("ok.html"), "<p>still here</p>\n").unwrap();

    let config = SiteConfig {
        source_dir: site.clone(),
        output_dir: dir.path().join("out"),
        ..SiteConfig::default()
    };
    let stats = build_site(&config).unwrap();

    assert_eq!(stats.pages_built, 1);
    // The .inc partials are not templates, so they mirror as assets.
    assert_eq!(stats.assets_copied, 2);
    assert_eq!(stats.failures.len(), 1);

    let (failed_path, err) = &stats.failures[0];
    assert!(failed_path.ends_with("page.html"));
    match err {
        ExpansionError::CyclicInclude { path, chain, .. } => {
            assert!(path.ends_with("a.inc"));
            assert!(chain.len() >= 3);
        }
        other => panic!("expected CyclicInclude, got {:?}", other),
    }
    assert!(dir.path().join("out/ok.html").is_file());
    assert!(!dir.path().join("out/page.html").exists());
}

#[test]
fn explicit_config_path_must_exist() {
    logging::init_test();
    let missing = Path::new("definitely/not/here/site.toml");
    let err = SiteConfig::load(Some(missing)).unwrap_err();
    assert!(matches!(err, BuildError::Config { .. }));
}

#[test]
fn nested_directories_are_mirrored() {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    let site = dir.path().join("site");
    fs::create_dir_all(site.join("docs/guides")).unwrap();
    fs::write(
        site.join("docs/guides/intro.html"),
        "#define v() ( 2.0 )\nVersion v()\n",
    )
    .unwrap();

    let config = SiteConfig {
        source_dir: site,
        output_dir: dir.path().join("out"),
        ignore: vec![PathBuf::from("tmp")],
        ..SiteConfig::default()
    };
    build_site(&config).unwrap();

    let page = fs::read_to_string(dir.path().join("out/docs/guides/intro.html")).unwrap();
    assert_eq!(page, "Version 2.0\n");
}
