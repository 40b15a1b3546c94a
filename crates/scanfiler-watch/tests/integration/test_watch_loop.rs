//! Watch loop scenarios: baseline, change detection, retries, tenant isolation

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use scanfiler_core::domain::RemoteEntry;
use scanfiler_watch::WatchError;

use crate::common::*;

#[tokio::test(start_paused = true)]
async fn test_first_tick_records_baseline_only() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.set_files("alice", &[("old.pdf", 100)]);

    let report = h.watch.tick().await.unwrap();
    let alice = report.tenant("alice").unwrap();
    assert!(alice.baseline);
    assert!(alice.new_files.is_empty());
    assert!(h.watch.known("alice").unwrap().contains("old.pdf"));

    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.new_files(), 0);
    assert!(h.remote.downloads().is_empty());

    let sent = h.finish().await;
    assert!(sent.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_new_file_is_delivered_once() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.watch.tick().await.unwrap();

    h.set_files("alice", &[("scan.pdf", 2048)]);
    let report = h.watch.tick().await.unwrap();
    let alice = report.tenant("alice").unwrap();
    assert!(!alice.baseline);
    assert_eq!(alice.new_files, vec!["scan.pdf"]);
    assert_eq!(alice.delivered, vec!["scan.pdf"]);

    assert_eq!(h.remote.downloads(), vec!["/scans/alice/scan.pdf"]);
    let uploads = h.nextcloud.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "alice");
    assert!(uploads[0].1.starts_with("Documents/scans/taxes/"));
    assert!(uploads[0].1.ends_with("_steuerbescheid_2023.pdf"));
    assert!(h.drive.uploads().is_empty());

    // Same listing again: nothing new
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.new_files(), 0);
    assert_eq!(h.remote.downloads().len(), 1);

    let sent = h.finish().await;
    let alice = messages_for(&sent, "alice_tg");
    assert_eq!(alice.len(), 2);
    assert_eq!(alice[0], "<b>New file: <code>scan.pdf</code></b>");
    assert!(alice[1].starts_with("Classified file: scan.pdf"));
    assert!(alice[1].contains("<b>Steuerbescheid 2023</b>"));
    assert!(alice[1].contains("<blockquote><b>Category: taxes</b></blockquote>"));
    assert!(alice[1].contains(">Nextcloud</a>"));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_file_is_abandoned() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.watch.tick().await.unwrap();
    h.classifier.fail_times(u32::MAX);

    h.set_files("alice", &[("scan.pdf", 2048)]);
    let started = Instant::now();
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("alice").unwrap().abandoned, vec!["scan.pdf"]);

    // Four pauses between five attempts
    assert!(started.elapsed() >= Duration::from_secs(20));
    assert_eq!(h.remote.downloads().len(), 5);
    assert_eq!(h.classifier.texts().len(), 5);
    assert!(h.nextcloud.uploads().is_empty());

    // Not retried in later ticks
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.new_files(), 0);
    assert_eq!(h.remote.downloads().len(), 5);

    let sent = h.finish().await;
    let alice = messages_for(&sent, "alice_tg");
    assert_eq!(alice.len(), 6);
    let tails = ["4 tries left", "3 tries left", "2 tries left", "1 try left", "0 tries left"];
    for (html, tail) in alice[1..].iter().zip(tails) {
        assert!(html.starts_with("Error classifying file: <code>scan.pdf</code>"));
        assert!(html.contains("<pre>Classifier answer is not valid JSON</pre>"));
        assert!(html.ends_with(tail));
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_after_failures() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.watch.tick().await.unwrap();
    h.classifier.fail_times(2);

    h.set_files("alice", &[("scan.pdf", 2048)]);
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("alice").unwrap().delivered, vec!["scan.pdf"]);
    assert_eq!(h.remote.downloads().len(), 3);
    assert_eq!(h.nextcloud.uploads().len(), 1);

    let sent = h.finish().await;
    let alice = messages_for(&sent, "alice_tg");
    assert_eq!(alice.len(), 4);
    assert!(alice[1].ends_with("4 tries left"));
    assert!(alice[2].ends_with("3 tries left"));
    assert!(alice[3].starts_with("Classified file: scan.pdf"));
}

#[tokio::test(start_paused = true)]
async fn test_tenants_are_isolated() {
    let mut h = Harness::with_tenants(&["alice", "bob"]);
    h.watch.tick().await.unwrap();

    h.set_files("alice", &[("a.pdf", 10)]);
    h.set_files("bob", &[("b.pdf", 20)]);
    h.remote.fail_downloads("/scans/alice/a.pdf", u32::MAX);

    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("alice").unwrap().abandoned, vec!["a.pdf"]);
    assert_eq!(report.tenant("bob").unwrap().delivered, vec!["b.pdf"]);

    let drive = h.drive.uploads();
    assert_eq!(drive.len(), 1);
    assert_eq!(drive[0].0, "bob");
    assert!(h.nextcloud.uploads().is_empty());

    let sent = h.finish().await;
    let bob = messages_for(&sent, "bob_tg");
    assert_eq!(bob.len(), 2);
    assert!(bob[1].contains(">Google Drive</a>"));
    let alice = messages_for(&sent, "alice_tg");
    assert_eq!(alice.len(), 6);
    assert!(alice
        .iter()
        .skip(1)
        .all(|m| m.starts_with("Error downloading file")));
}

#[tokio::test(start_paused = true)]
async fn test_tenant_without_storage_fails_once() {
    let mut h = Harness::with_tenants(&["carol"]);
    h.watch.tick().await.unwrap();

    h.set_files("carol", &[("scan.pdf", 10)]);
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("carol").unwrap().abandoned, vec!["scan.pdf"]);
    assert_eq!(h.remote.downloads().len(), 1);
    assert!(h.nextcloud.uploads().is_empty());
    assert!(h.drive.uploads().is_empty());

    let sent = h.finish().await;
    let carol = messages_for(&sent, "carol_tg");
    assert_eq!(carol.len(), 2);
    assert!(carol[1].starts_with("Configuration error"));
    assert!(carol[1].contains("No cloud storage provider set for user carol"));
    assert!(carol[1].ends_with("Not retrying"));
}

#[tokio::test(start_paused = true)]
async fn test_unconfigured_folder_is_not_notified() {
    let mut h = Harness::with_tenants(&["dave"]);
    h.watch.tick().await.unwrap();

    h.set_files("dave", &[("scan.pdf", 10)]);
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("dave").unwrap().abandoned, vec!["scan.pdf"]);
    assert_eq!(h.remote.downloads().len(), 1);

    let sent = h.finish().await;
    assert!(sent.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_known_set_follows_listing() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.set_files("alice", &[("a.pdf", 10)]);
    h.watch.tick().await.unwrap();

    // Deleted file leaves the known set
    h.set_files("alice", &[]);
    h.watch.tick().await.unwrap();
    assert!(h.watch.known("alice").unwrap().is_empty());

    // Re-added file with the same name is new again
    h.set_files("alice", &[("a.pdf", 10), ("b.pdf", 20)]);
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("alice").unwrap().new_files, vec!["a.pdf", "b.pdf"]);

    let known = h.watch.known("alice").unwrap();
    assert_eq!(known.len(), 2);
    assert!(known.contains("a.pdf"));
    assert!(known.contains("b.pdf"));
}

#[tokio::test(start_paused = true)]
async fn test_tenant_listing_failure_keeps_known_set() {
    let mut h = Harness::with_tenants(&["alice", "bob"]);
    h.set_files("alice", &[("a.pdf", 10)]);
    h.watch.tick().await.unwrap();

    h.remote.fail_listing("/scans/alice");
    h.set_files("bob", &[("b.pdf", 10)]);
    let report = h.watch.tick().await.unwrap();
    let alice = report.tenant("alice").unwrap();
    assert!(alice.listing_error.as_deref().unwrap().contains("temporarily unavailable"));
    assert!(h.watch.known("alice").unwrap().contains("a.pdf"));
    assert_eq!(report.tenant("bob").unwrap().delivered, vec!["b.pdf"]);

    // Files added while the folder was unreadable are picked up once
    h.remote.heal_listing("/scans/alice");
    h.set_files("alice", &[("a.pdf", 10), ("c.pdf", 30)]);
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("alice").unwrap().new_files, vec!["c.pdf"]);
}

#[tokio::test(start_paused = true)]
async fn test_first_listing_failure_defers_baseline() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.set_files("alice", &[("preexisting.pdf", 10)]);
    h.remote.fail_listing("/scans/alice");
    let report = h.watch.tick().await.unwrap();
    let alice = report.tenant("alice").unwrap();
    assert!(alice.baseline);
    assert!(alice.listing_error.is_some());

    h.remote.heal_listing("/scans/alice");
    let report = h.watch.tick().await.unwrap();
    let alice = report.tenant("alice").unwrap();
    assert!(alice.baseline);
    assert!(alice.new_files.is_empty());
    assert!(h.watch.known("alice").unwrap().contains("preexisting.pdf"));
    assert!(h.remote.downloads().is_empty());

    h.set_files("alice", &[("preexisting.pdf", 10), ("later.pdf", 20)]);
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("alice").unwrap().delivered, vec!["later.pdf"]);
    assert_eq!(h.remote.downloads(), vec!["/scans/alice/later.pdf"]);
}

#[tokio::test(start_paused = true)]
async fn test_root_listing_failure_is_fatal() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.remote.fail_listing(ROOT);

    let err = h.watch.tick().await.unwrap_err();
    let WatchError::Listing { path, .. } = &err;
    assert_eq!(path, ROOT);
    assert!(err.to_string().contains("temporarily unavailable"));
}

#[tokio::test(start_paused = true)]
async fn test_new_tenant_folder_is_processed() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.watch.tick().await.unwrap();

    h.set_tenants(&["alice", "bob"]);
    h.set_files("bob", &[("b.pdf", 10)]);
    let report = h.watch.tick().await.unwrap();
    let bob = report.tenant("bob").unwrap();
    assert!(!bob.baseline);
    assert_eq!(bob.delivered, vec!["b.pdf"]);
}

#[tokio::test(start_paused = true)]
async fn test_root_files_and_subfolders_are_ignored() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.watch.tick().await.unwrap();

    h.remote.set_listing(
        ROOT,
        vec![RemoteEntry::folder("alice"), RemoteEntry::file("stray.pdf", 5)],
    );
    h.remote.set_listing(
        "/scans/alice",
        vec![RemoteEntry::folder("archive"), RemoteEntry::file("a.pdf", 10)],
    );
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.ignored, vec!["stray.pdf"]);
    assert_eq!(report.tenants.len(), 1);
    assert_eq!(report.tenant("alice").unwrap().new_files, vec!["a.pdf"]);
    assert_eq!(h.remote.downloads(), vec!["/scans/alice/a.pdf"]);
}

#[tokio::test(start_paused = true)]
async fn test_growing_file_waits_to_settle() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.watch.tick().await.unwrap();

    h.remote.queue_listings(
        "/scans/alice",
        vec![
            vec![RemoteEntry::file("scan.pdf", 100)],
            vec![RemoteEntry::file("scan.pdf", 4096)],
        ],
    );
    let started = Instant::now();
    let report = h.watch.tick().await.unwrap();
    assert_eq!(report.tenant("alice").unwrap().delivered, vec!["scan.pdf"]);
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_stable_file_does_not_wait() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.watch.tick().await.unwrap();

    h.set_files("alice", &[("scan.pdf", 100)]);
    let started = Instant::now();
    h.watch.tick().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_on_cancel() {
    let mut h = Harness::with_tenants(&["alice"]);
    let token = CancellationToken::new();
    let canceller = token.clone();

    let (result, _) = tokio::join!(h.watch.run(token), async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        canceller.cancel();
    });
    result.unwrap();

    // Ticks at 0s, 5s and 10s
    assert_eq!(h.remote.list_calls(ROOT), 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_returns_listing_error() {
    let mut h = Harness::with_tenants(&["alice"]);
    h.remote.fail_listing(ROOT);

    let result = h.watch.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(WatchError::Listing { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_run_with_cancelled_token_does_nothing() {
    let mut h = Harness::with_tenants(&["alice"]);
    let token = CancellationToken::new();
    token.cancel();

    h.watch.run(token).await.unwrap();
    assert_eq!(h.remote.list_calls(ROOT), 0);
}
