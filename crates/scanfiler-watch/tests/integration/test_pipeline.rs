//! Direct pipeline tests: stage wiring, truncation, scratch cleanup

use scanfiler_core::domain::{RemoteEntry, TenantRegistry};
use scanfiler_watch::{FileOutcome, PipelineSettings};

use crate::common::*;

fn alice() -> scanfiler_core::domain::Tenant {
    registry().get("alice")
}

#[tokio::test(start_paused = true)]
async fn test_delivered_outcome() {
    let h = Harness::new();
    h.set_files("alice", &[("scan.pdf", 10)]);

    let outcome = h
        .pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;

    let FileOutcome::Delivered {
        classification: got,
        stored,
        attempts,
    } = outcome
    else {
        panic!("expected delivery");
    };
    assert_eq!(attempts, 1);
    assert_eq!(got, classification());
    assert_eq!(stored.provider, "Nextcloud");
    assert!(stored.locator.starts_with("https://files.example.com/Documents/scans/taxes/"));

    // Uploaded bytes are the downloaded file
    let uploads = h.nextcloud.uploads();
    assert_eq!(uploads[0].2, "%PDF-1.4 /scans/alice/scan.pdf".len());
}

#[tokio::test(start_paused = true)]
async fn test_ocr_language_is_passed() {
    let h = Harness::new();
    h.set_files("alice", &[("scan.pdf", 10)]);

    h.pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;

    let calls = h.extractor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "deu");
    assert_eq!(calls[0].0.file_name().unwrap(), "scan.pdf");
}

#[tokio::test(start_paused = true)]
async fn test_text_is_truncated_by_characters() {
    let h = Harness::with_settings(PipelineSettings {
        max_chars: 5,
        ..settings()
    });
    h.set_files("alice", &[("scan.pdf", 10)]);
    h.extractor.set_text("äöüßéxyz");

    h.pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;

    assert_eq!(h.classifier.texts(), vec!["äöüßé"]);
}

#[tokio::test(start_paused = true)]
async fn test_short_text_is_not_padded() {
    let h = Harness::new();
    h.set_files("alice", &[("scan.pdf", 10)]);
    h.extractor.set_text("kurz");

    h.pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;

    assert_eq!(h.classifier.texts(), vec!["kurz"]);
}

#[tokio::test(start_paused = true)]
async fn test_scratch_directory_is_removed() {
    let h = Harness::new();
    h.set_files("alice", &[("scan.pdf", 10)]);
    h.extractor.fail_times(1);

    let outcome = h
        .pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;
    assert_eq!(outcome.attempts(), 2);

    let calls = h.extractor.calls();
    assert_eq!(calls.len(), 2);
    // Each attempt used its own directory and none survived
    assert_ne!(calls[0].0, calls[1].0);
    for (path, _) in &calls {
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }
}

#[tokio::test(start_paused = true)]
async fn test_download_failure_restarts_attempt() {
    let h = Harness::new();
    h.set_files("alice", &[("scan.pdf", 10)]);
    h.remote.fail_downloads("/scans/alice/scan.pdf", 1);

    let outcome = h
        .pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;
    assert!(outcome.is_delivered());
    assert_eq!(outcome.attempts(), 2);
    assert_eq!(h.extractor.calls().len(), 1);

    let sent = h.finish().await;
    let alice = messages_for(&sent, "alice_tg");
    assert!(alice[1].starts_with("Error downloading file: <code>scan.pdf</code>"));
    assert!(alice[1].contains("426 Connection closed; transfer aborted"));
}

#[tokio::test(start_paused = true)]
async fn test_upload_failure_is_retried_from_download() {
    let h = Harness::new();
    h.set_files("alice", &[("scan.pdf", 10)]);
    h.nextcloud.fail_times(u32::MAX);

    let outcome = h
        .pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;

    let FileOutcome::Abandoned { attempts, last_error } = outcome else {
        panic!("expected abandonment");
    };
    assert_eq!(attempts, 5);
    assert_eq!(last_error, "Error uploading file: HTTP 507 Insufficient Storage");
    assert_eq!(h.remote.downloads().len(), 5);
    assert_eq!(h.nextcloud.uploads().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_budget() {
    let h = Harness::with_settings(PipelineSettings {
        max_attempts: 1,
        ..settings()
    });
    h.set_files("alice", &[("scan.pdf", 10)]);
    h.classifier.fail_times(u32::MAX);

    let outcome = h
        .pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;
    assert_eq!(outcome.attempts(), 1);

    let sent = h.finish().await;
    let alice = messages_for(&sent, "alice_tg");
    assert_eq!(alice.len(), 2);
    assert!(alice[1].ends_with("0 tries left"));
}

#[tokio::test(start_paused = true)]
async fn test_size_check_failure_is_ignored() {
    let h = Harness::new();
    h.remote.fail_listing("/scans/alice");

    let outcome = h
        .pipeline
        .process(&alice(), "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;
    assert!(outcome.is_delivered());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_tenant_is_permanent() {
    let h = Harness::new();
    let tenant = TenantRegistry::default().get("alice");

    let outcome = h
        .pipeline
        .process(&tenant, "/scans/alice", &RemoteEntry::file("scan.pdf", 10))
        .await;
    let FileOutcome::Abandoned { attempts, last_error } = outcome else {
        panic!("expected abandonment");
    };
    assert_eq!(attempts, 1);
    assert_eq!(last_error, "Configuration error: Unknown user: alice");
}
