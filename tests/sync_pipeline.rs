// tests/sync_pipeline.rs
//
// Orchestrator behaviour: fresh vs fallback per category, and the
// no-credential bootstrap path.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, Router};
use std::{
    collections::HashMap,
    fs,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use cms_sync::content::{ContentCategory, Snapshot};
use cms_sync::images::ImageResolver;
use cms_sync::normalize::RawRows;
use cms_sync::pipeline::{self, CategoryOutcome, SyncMode};
use cms_sync::sheets::TabularSource;
use cms_sync::snapshot::load_fallback;
use cms_sync::SyncConfig;

struct MockSheets {
    sheets: HashMap<&'static str, RawRows>,
    calls: AtomicUsize,
}

impl MockSheets {
    fn new(sheets: Vec<(&'static str, RawRows)>) -> Self {
        Self {
            sheets: sheets.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TabularSource for MockSheets {
    async fn fetch_rows(&self, sheet: &str) -> Result<RawRows> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sheets
            .get(sheet)
            .cloned()
            .ok_or_else(|| anyhow!("sheet {sheet} unavailable"))
    }
}

fn grid(rows: &[&[&str]]) -> RawRows {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn config(root: &std::path::Path) -> SyncConfig {
    SyncConfig {
        // nothing listens here; any image fetch would fail loudly
        image_base: "http://127.0.0.1:1/d".into(),
        ..SyncConfig::rooted_at(root)
    }
}

#[tokio::test]
async fn mixed_success_and_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    fs::create_dir_all(&cfg.data_dir).unwrap();

    let previous_gallery = r#"[
  {
    "id": 1,
    "imageurl": "cms/old.jpg",
    "alt": "Old photo"
  }
]"#;
    fs::write(cfg.data_dir.join("gallery.json"), previous_gallery).unwrap();

    let source = MockSheets::new(vec![(
        "Events",
        grid(&[
            &["Title", "Date", "Location", "Description"],
            &["Yoga Day", "21 June", "Avondale", "Wellness"],
            &["", "", "", ""],
            &["Teej", "2 August"],
        ]),
    )]);
    let images = ImageResolver::new(&cfg).unwrap();

    let report = pipeline::sync_all(&cfg, &source, &images).await;

    assert_eq!(report.mode, SyncMode::Remote);
    assert!(report.had_errors);
    assert_eq!(
        report.outcome(ContentCategory::Events),
        Some(CategoryOutcome::Fresh { count: 2 })
    );
    assert_eq!(
        report.outcome(ContentCategory::Gallery),
        Some(CategoryOutcome::Fallback { count: 1 })
    );
    assert_eq!(
        report.outcome(ContentCategory::Committee),
        Some(CategoryOutcome::Fallback { count: 0 })
    );
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);

    // fresh data, contiguous ids
    let events = load_fallback(&cfg.data_dir.join("events.json"), ContentCategory::Events);
    let Snapshot::Events(events) = events else {
        panic!("events snapshot");
    };
    assert_eq!(events.len(), 2);
    assert_eq!((events[0].id, events[1].id), (1, 2));
    assert_eq!(events[1].title, "Teej");
    assert_eq!(events[1].location, "");

    // failed categories: untouched, or an empty array when nothing existed
    assert_eq!(
        fs::read_to_string(cfg.data_dir.join("gallery.json")).unwrap(),
        previous_gallery
    );
    assert_eq!(
        fs::read_to_string(cfg.data_dir.join("committee.json")).unwrap(),
        "[]"
    );
}

#[tokio::test]
async fn local_image_identifiers_pass_through_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());

    let source = MockSheets::new(vec![
        ("Events", grid(&[&["title"]])),
        (
            "Gallery",
            grid(&[
                &["imageUrl", "alt", "caption"],
                &["event-gangaur-puja", "Gangaur Puja", "Traditional festival"],
                &["https://example.com/x.jpg", "External", ""],
            ]),
        ),
        (
            "Committee",
            grid(&[
                &["Name", "Title", "Photo URL"],
                &["Mrs. Agarwal", "Secretary", "committee-members-secretary"],
            ]),
        ),
    ]);
    let images = ImageResolver::new(&cfg).unwrap();

    let report = pipeline::sync_all(&cfg, &source, &images).await;
    assert!(!report.had_errors);
    assert_eq!(
        report.outcome(ContentCategory::Events),
        Some(CategoryOutcome::Fresh { count: 0 })
    );

    let Snapshot::Gallery(gallery) =
        load_fallback(&cfg.data_dir.join("gallery.json"), ContentCategory::Gallery)
    else {
        panic!("gallery snapshot");
    };
    assert_eq!(gallery[0].imageurl, "event-gangaur-puja");
    assert_eq!(gallery[1].imageurl, "https://example.com/x.jpg");
    assert_eq!(gallery[1].caption.as_deref(), Some(""));

    // "Photo URL" normalizes to photo_url, which is not the schema's photourl
    let Snapshot::Committee(committee) =
        load_fallback(&cfg.data_dir.join("committee.json"), ContentCategory::Committee)
    else {
        panic!("committee snapshot");
    };
    assert_eq!(committee[0].name, "Mrs. Agarwal");
    assert_eq!(committee[0].photourl, "");

    assert_eq!(
        fs::read_to_string(cfg.data_dir.join("events.json")).unwrap(),
        "[]"
    );
}

#[tokio::test]
async fn unreachable_image_host_keeps_drive_url() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let drive = "https://drive.google.com/file/d/offline1/view";

    let source = MockSheets::new(vec![
        ("Events", grid(&[&["title"], &["Holi"]])),
        ("Gallery", grid(&[&["imageurl", "alt"], &[drive, "Offline"]])),
        ("Committee", grid(&[&["name"]])),
    ]);
    let images = ImageResolver::new(&cfg).unwrap();

    let report = pipeline::sync_all(&cfg, &source, &images).await;
    assert!(!report.had_errors, "image failures are not category failures");

    let Snapshot::Gallery(gallery) =
        load_fallback(&cfg.data_dir.join("gallery.json"), ContentCategory::Gallery)
    else {
        panic!("gallery snapshot");
    };
    assert_eq!(gallery[0].imageurl, drive);
}

async fn count_request(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Answers every request with 500 and counts it.
async fn counting_host() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .fallback(count_request)
        .with_state(hits.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    (format!("http://{addr}"), hits)
}

#[tokio::test]
async fn missing_credential_bootstraps_placeholders_only() {
    let (host, hits) = counting_host().await;
    let tmp = tempfile::tempdir().unwrap();
    let cfg = SyncConfig {
        sheets_api_base: host.clone(),
        image_base: format!("{host}/d"),
        ..config(tmp.path())
    };
    fs::create_dir_all(&cfg.data_dir).unwrap();
    let existing = r#"[{"id":1,"title":"Kept","date":"","location":"","description":""}]"#;
    fs::write(cfg.data_dir.join("events.json"), existing).unwrap();

    let report = pipeline::run(&cfg).await.expect("no credential is not fatal");

    assert_eq!(report.mode, SyncMode::Fallback);
    assert!(!report.had_errors);
    assert_eq!(
        report.outcome(ContentCategory::Events),
        Some(CategoryOutcome::Fallback { count: 1 })
    );
    assert_eq!(
        fs::read_to_string(cfg.data_dir.join("events.json")).unwrap(),
        existing
    );
    for file in ["gallery.json", "committee.json"] {
        let text = fs::read_to_string(cfg.data_dir.join(file)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }
    assert!(cfg.images_dir.is_dir());
    assert_eq!(hits.load(Ordering::SeqCst), 0, "no network traffic without a credential");
}

#[tokio::test]
async fn malformed_credential_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    fs::write(&cfg.credential_path, "{ oops").unwrap();

    assert!(pipeline::run(&cfg).await.is_err());
}

#[tokio::test]
async fn credential_without_usable_key_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    fs::write(
        &cfg.credential_path,
        r#"{"client_email":"bot@site.iam.gserviceaccount.com"}"#,
    )
    .unwrap();

    assert!(pipeline::run(&cfg).await.is_err());
}
