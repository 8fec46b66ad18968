//! Two clients editing one document through the in-process broker.

mod common;

use std::time::Duration;

use common::FakeBackend;
use collab_docs::models::EditMessage;
use collab_docs::routes::Route;
use collab_docs::views::{EditorView, LoginView};
use collab_docs::ws::{self, SyncHandle, SyncOptions, SyncSnapshot, SyncStatus, OFFLINE_NOTICE};
use pretty_assertions::assert_eq;
use uuid::Uuid;

const WAIT: Duration = Duration::from_secs(5);

fn join(backend: &FakeBackend, token: &str, doc_id: Uuid, username: &str) -> SyncHandle {
    let options = SyncOptions::from_config(&backend.config(), token, doc_id).unwrap();
    ws::open(options, username, "")
}

async fn wait_until(handle: &SyncHandle, check: impl FnMut(&SyncSnapshot) -> bool) -> SyncSnapshot {
    let mut watch = handle.watch();
    let snapshot = tokio::time::timeout(WAIT, watch.wait_for(check))
        .await
        .expect("timed out waiting for the session")
        .unwrap()
        .clone();
    snapshot
}

fn has_members(snapshot: &SyncSnapshot, members: &[&str]) -> bool {
    snapshot.presence == members
}

#[tokio::test]
async fn test_edits_reach_the_other_client() {
    let backend = FakeBackend::start().await;
    let alice_token = backend.add_user("alice", "pw").await;
    let bob_token = backend.add_user("bob", "pw").await;
    let doc_id = backend.add_doc("alice", "Shared", "").await;

    let mut alice = join(&backend, &alice_token, doc_id, "alice");
    wait_until(&alice, |s| has_members(s, &["alice"])).await;
    let bob = join(&backend, &bob_token, doc_id, "bob");

    let live = wait_until(&bob, |s| has_members(s, &["alice", "bob"])).await;
    assert_eq!(live.status, SyncStatus::Live);
    wait_until(&alice, |s| has_members(s, &["alice", "bob"])).await;

    alice.edit("h");
    alice.edit("he");
    alice.edit("hello");
    wait_until(&bob, |s| s.content == "hello").await;
    assert_eq!(alice.snapshot().content, "hello");
    assert_eq!(backend.doc_content(doc_id).await.as_deref(), Some("hello"));

    bob.close().await;
    wait_until(&alice, |s| has_members(s, &["alice"])).await;
    alice.close().await;
}

#[tokio::test]
async fn test_own_echo_is_ignored() {
    let backend = FakeBackend::start().await;
    let alice_token = backend.add_user("alice", "pw").await;
    let bob_token = backend.add_user("bob", "pw").await;
    let doc_id = backend.add_doc("alice", "Shared", "").await;

    let alice = join(&backend, &alice_token, doc_id, "alice");
    wait_until(&alice, |s| has_members(s, &["alice"])).await;
    let mut bob = join(&backend, &bob_token, doc_id, "bob");
    wait_until(&bob, |s| has_members(s, &["alice", "bob"])).await;

    bob.edit("bob's draft");
    wait_until(&alice, |s| s.content == "bob's draft").await;

    // Something claiming to be bob reaches both clients
    backend
        .publish(doc_id, &EditMessage::edit("bob", "spoofed"))
        .await;
    wait_until(&alice, |s| s.content == "spoofed").await;

    // Messages arrive in order, so once bob sees carol the spoof has been handled
    let marker = EditMessage {
        content: Some("alice,bob,carol".to_string()),
        ..EditMessage::join("carol")
    };
    backend.publish(doc_id, &marker).await;
    let after = wait_until(&bob, |s| s.presence.len() == 3).await;
    assert_eq!(after.content, "bob's draft");

    alice.close().await;
    bob.close().await;
}

#[tokio::test]
async fn test_cursor_and_unknown_messages_change_nothing() {
    let backend = FakeBackend::start().await;
    let token = backend.add_user("alice", "pw").await;
    let doc_id = backend.add_doc("alice", "Solo", "").await;

    let mut alice = join(&backend, &token, doc_id, "alice");
    wait_until(&alice, |s| has_members(s, &["alice"])).await;
    alice.edit("kept");
    wait_until(&alice, |s| s.content == "kept").await;

    let cursor: EditMessage =
        serde_json::from_str(r#"{"sender":"bob","type":"CURSOR","content":"12"}"#).unwrap();
    let unknown: EditMessage =
        serde_json::from_str(r#"{"sender":"bob","type":"WAVE","content":"hi"}"#).unwrap();
    backend.publish(doc_id, &cursor).await;
    backend.publish(doc_id, &unknown).await;
    backend.publish(doc_id, &EditMessage::edit("bob", "last")).await;

    wait_until(&alice, |s| s.content == "last").await;
    assert_eq!(alice.snapshot().presence, ["alice"]);
    alice.close().await;
}

#[tokio::test]
async fn test_rejected_token_goes_offline_with_one_notice() {
    let backend = FakeBackend::start().await;
    backend.add_user("alice", "pw").await;
    let doc_id = backend.add_doc("alice", "Solo", "start").await;

    let options = SyncOptions::from_config(&backend.config(), "forged", doc_id).unwrap();
    let mut handle = ws::open(options, "alice", "start");

    let notice = tokio::time::timeout(WAIT, handle.next_notice())
        .await
        .unwrap();
    assert_eq!(notice.as_deref(), Some(OFFLINE_NOTICE));
    let offline = wait_until(&handle, |s| s.status == SyncStatus::Offline).await;
    assert_eq!(offline.status.label(), "Offline Mode");

    // Typing keeps working locally and nothing reaches the server
    handle.edit("start, offline");
    wait_until(&handle, |s| s.content == "start, offline").await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(handle.try_notice(), None);
    assert_eq!(backend.doc_content(doc_id).await.as_deref(), Some("start"));

    handle.close().await;
}

#[tokio::test]
async fn test_editor_view_restores_a_version_for_everyone() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = backend.context(&dir);
    backend.add_user("alice", "pw").await;
    let bob_token = backend.add_user("bob", "pw").await;
    let doc_id = backend.add_doc("alice", "Plan", "current").await;
    let version_id = backend.add_version(doc_id, "alice", "first draft").await;
    assert!(LoginView::new("alice", "pw").submit(&mut ctx).await);

    let mut view = EditorView::open(&mut ctx, doc_id).await.unwrap();
    assert_eq!(ctx.route(), Route::Editor(doc_id));
    assert_eq!(view.title, "Plan");
    assert_eq!(view.content(), "current");
    assert_eq!(view.history.len(), 1);
    tokio::time::timeout(WAIT, async {
        while view.presence() != ["alice"] {
            view.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    assert_eq!(view.status_label(), "Live");

    let bob = join(&backend, &bob_token, doc_id, "bob");
    wait_until(&bob, |s| has_members(s, &["alice", "bob"])).await;

    assert!(!view.request_restore(version_id + 1));
    assert!(view.request_restore(version_id));
    assert_eq!(view.confirm.confirm_text(), "Confirm");
    view.confirm(&mut ctx);
    assert_eq!(ctx.toasts.drain()[0].message, "Version restored");

    wait_until(&bob, |s| s.content == "first draft").await;

    bob.close().await;
    view.close(&mut ctx).await;
    assert_eq!(ctx.route(), Route::Dashboard);
}

#[tokio::test]
async fn test_missing_document_returns_to_dashboard() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = backend.context(&dir);
    backend.add_user("alice", "pw").await;
    assert!(LoginView::new("alice", "pw").submit(&mut ctx).await);

    let view = EditorView::open(&mut ctx, Uuid::new_v4()).await;
    assert!(view.is_none());
    assert_eq!(ctx.route(), Route::Dashboard);
}

#[tokio::test]
async fn test_broker_dropping_the_socket_goes_offline_once() {
    let backend = FakeBackend::start().await;
    let token = backend.add_user("alice", "pw").await;
    let doc_id = backend.add_doc("alice", "Solo", "").await;

    let mut alice = join(&backend, &token, doc_id, "alice");
    wait_until(&alice, |s| has_members(s, &["alice"])).await;

    // Edits racing the drop either fail to send or find no connection, neither adds a notice
    backend.drop_connections();
    alice.edit("typed during the drop");
    alice.edit("typed during the drop, again");

    let notice = tokio::time::timeout(WAIT, alice.next_notice()).await.unwrap();
    assert_eq!(notice.as_deref(), Some(OFFLINE_NOTICE));
    wait_until(&alice, |s| s.status == SyncStatus::Offline).await;

    alice.edit("offline now");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(alice.try_notice(), None);
    assert_eq!(alice.snapshot().content, "offline now");
    assert_ne!(backend.doc_content(doc_id).await.as_deref(), Some("offline now"));

    // Reconnecting is explicit and joins again
    alice.reconnect();
    let live = wait_until(&alice, |s| s.status == SyncStatus::Live).await;
    assert_eq!(live.content, "offline now");
    wait_until(&alice, |s| has_members(s, &["alice"])).await;
    assert_eq!(alice.try_notice(), None);

    alice.close().await;
}

#[tokio::test]
async fn test_editor_keeps_every_line_typed_in_one_turn() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = backend.context(&dir);
    backend.add_user("alice", "pw").await;
    let bob_token = backend.add_user("bob", "pw").await;
    let doc_id = backend.add_doc("alice", "Plan", "current").await;
    let version_id = backend.add_version(doc_id, "alice", "first draft").await;
    assert!(LoginView::new("alice", "pw").submit(&mut ctx).await);

    let mut view = EditorView::open(&mut ctx, doc_id).await.unwrap();
    tokio::time::timeout(WAIT, async {
        while view.presence() != ["alice"] {
            view.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    let mut bob = join(&backend, &bob_token, doc_id, "bob");
    wait_until(&bob, |s| has_members(s, &["alice", "bob"])).await;

    // No await in between, the session task has not run yet
    view.append_line("first");
    view.append_line("second");
    assert_eq!(view.content(), "current\nfirst\nsecond");
    assert_eq!(view.snapshot().content, "current\nfirst\nsecond");

    wait_until(&bob, |s| s.content == "current\nfirst\nsecond").await;
    assert_eq!(view.content(), "current\nfirst\nsecond");

    // A restore followed right away by more typing keeps the restored text
    assert!(view.request_restore(version_id));
    view.confirm(&mut ctx);
    view.append_line("after");
    assert_eq!(view.content(), "first draft\nafter");
    wait_until(&bob, |s| s.content == "first draft\nafter").await;

    // Remote edits still land once the session has caught up
    bob.edit("from bob");
    tokio::time::timeout(WAIT, async {
        while view.content() != "from bob" {
            view.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    bob.close().await;
    view.close(&mut ctx).await;
}
