//! Integration tests for the guard against a live session store.
//!
//! Drives a real `SessionStore` over in-memory mediums and checks the
//! outcomes a `GuardWatcher` publishes as state and location change.

use std::time::Duration;

use rollcall_guard::{GuardOutcome, GuardWatcher, RouteGuard, RouteTable};
use rollcall_protocol::{Role, User, UserId};
use rollcall_session::{ManualClock, SessionConfig, SessionState, SessionStore};
use rollcall_storage::{MemoryCookieJar, MemoryStore};
use tokio::sync::watch;

const START: u64 = 1_700_000_000_000;

// =========================================================================
// Helpers
// =========================================================================

type Store = SessionStore<MemoryStore, MemoryCookieJar, ManualClock>;

fn store() -> Store {
    SessionStore::new(
        MemoryStore::new(),
        MemoryCookieJar::new(),
        ManualClock::new(START),
        SessionConfig::default(),
    )
}

fn user(role: Role) -> User {
    User {
        id: UserId::from("u-42"),
        role,
        name: "Sam".into(),
        email: None,
    }
}

fn watch_at(store: &Store, at: &str) -> (GuardWatcher, watch::Sender<String>) {
    let (location_tx, location_rx) = watch::channel(at.to_string());
    let watcher = GuardWatcher::spawn(RouteGuard::default(), store.subscribe(), location_rx);
    (watcher, location_tx)
}

async fn next(watcher: &mut GuardWatcher) -> GuardOutcome {
    tokio::time::timeout(Duration::from_secs(1), watcher.changed())
        .await
        .expect("watcher published nothing");
    watcher.outcome()
}

// =========================================================================
// Evaluation over many inputs
// =========================================================================

const LOCATIONS: [&str; 12] = [
    "/",
    "/login",
    "/login?next=/admin",
    "/diagnostics",
    "/about",
    "/admin",
    "/admin/users/3",
    "/teacher/",
    "/student/grades#term-2",
    "/parent",
    "/accountant/fees",
    "/administrator",
];

#[test]
fn test_evaluate_never_redirects_while_loading() {
    let guard = RouteGuard::default();
    let loading_states = [
        SessionState::loading(),
        SessionState {
            loading: true,
            authenticated: true,
            user: Some(user(Role::Admin)),
        },
    ];
    for state in &loading_states {
        for location in LOCATIONS {
            assert_eq!(guard.evaluate(state, location), GuardOutcome::Loading, "{location}");
        }
    }
}

#[test]
fn test_evaluate_signed_out_redirects_only_from_protected_areas() {
    let guard = RouteGuard::default();
    let table = RouteTable::default();
    for location in LOCATIONS {
        let outcome = guard.evaluate(&SessionState::signed_out(), location);
        if table.is_protected(location) {
            assert_eq!(outcome, GuardOutcome::RedirectToSignIn("/login".into()), "{location}");
        } else {
            assert_eq!(outcome, GuardOutcome::Render, "{location}");
        }
    }
}

#[test]
fn test_evaluate_every_role_lands_on_its_home_from_sign_in() {
    let guard = RouteGuard::default();
    for role in Role::KNOWN {
        assert_eq!(
            guard.evaluate(&SessionState::authenticated(user(role)), "/login"),
            GuardOutcome::RedirectHome(format!("/{role}/dashboard"))
        );
    }
}

#[test]
fn test_evaluate_custom_table_home() {
    let mut table = RouteTable::default();
    table.homes.insert(Role::Admin, "/admin/overview".into());
    let guard = RouteGuard::new(table).unwrap();

    assert_eq!(
        guard.evaluate(&SessionState::authenticated(user(Role::Admin)), "/login"),
        GuardOutcome::RedirectHome("/admin/overview".into())
    );
}

// =========================================================================
// Watcher
// =========================================================================

#[tokio::test]
async fn test_watcher_starts_loading_then_redirects_after_empty_restore() {
    let store = store();
    let (mut watcher, _location) = watch_at(&store, "/admin/x");
    assert_eq!(watcher.outcome(), GuardOutcome::Loading);

    store.restore_and_validate().await;

    assert_eq!(
        next(&mut watcher).await,
        GuardOutcome::RedirectToSignIn("/login".into())
    );
}

#[tokio::test]
async fn test_watcher_signed_in_renders_protected_page_immediately() {
    let store = store();
    store.establish(user(Role::Teacher), "tok".into()).await;

    let (mut watcher, _location) = watch_at(&store, "/teacher/classes");

    assert_eq!(watcher.outcome(), GuardOutcome::Render);
}

#[tokio::test]
async fn test_watcher_login_on_sign_in_page_redirects_home() {
    let store = store();
    store.restore_and_validate().await;
    let (mut watcher, _location) = watch_at(&store, "/login");
    assert_eq!(watcher.outcome(), GuardOutcome::Render);

    store.establish(user(Role::Accountant), "tok".into()).await;

    assert_eq!(
        next(&mut watcher).await,
        GuardOutcome::RedirectHome("/accountant/dashboard".into())
    );
}

#[tokio::test]
async fn test_watcher_logout_inside_protected_area_redirects_to_sign_in() {
    let store = store();
    store.establish(user(Role::Parent), "tok".into()).await;
    let (mut watcher, _location) = watch_at(&store, "/parent/dashboard");
    assert_eq!(watcher.outcome(), GuardOutcome::Render);

    store.clear().await;

    assert_eq!(
        next(&mut watcher).await,
        GuardOutcome::RedirectToSignIn("/login".into())
    );
}

#[tokio::test]
async fn test_watcher_follows_location_changes() {
    let store = store();
    store.restore_and_validate().await;
    let (mut watcher, location) = watch_at(&store, "/");
    assert_eq!(watcher.outcome(), GuardOutcome::Render);

    location.send_replace("/student/grades".into());

    assert_eq!(
        next(&mut watcher).await,
        GuardOutcome::RedirectToSignIn("/login".into())
    );
}

#[tokio::test]
async fn test_watcher_stops_when_store_dropped() {
    let store = store();
    let (mut watcher, _location) = watch_at(&store, "/");

    drop(store);

    assert!(!watcher.changed().await);
}
