use super::*;

fn split_store() -> (TokenStore, Arc<MemoryStorage>, Arc<MemoryStorage>) {
    let durable = Arc::new(MemoryStorage::new());
    let ephemeral = Arc::new(MemoryStorage::new());
    let store = TokenStore::new(durable.clone(), ephemeral.clone());
    (store, durable, ephemeral)
}

// =============================================================================
// remember-me backend selection
// =============================================================================

#[test]
fn remember_me_defaults_true() {
    let (store, _, _) = split_store();
    assert!(store.remember_me());
}

#[test]
fn remember_me_writes_go_to_durable() {
    let (store, durable, ephemeral) = split_store();
    store.set_remember_me(true);
    store.set_tokens("T1", Some("R1"));
    assert_eq!(durable.get(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
    assert_eq!(durable.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    assert_eq!(ephemeral.get(ACCESS_TOKEN_KEY), None);
}

#[test]
fn session_only_writes_go_to_ephemeral() {
    let (store, durable, ephemeral) = split_store();
    store.set_remember_me(false);
    store.set_tokens("T1", Some("R1"));
    assert_eq!(ephemeral.get(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
    assert_eq!(durable.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(store.token().as_deref(), Some("T1"));
    assert_eq!(store.refresh_token().as_deref(), Some("R1"));
}

#[test]
fn flag_flip_write_scrubs_other_backend() {
    let (store, durable, ephemeral) = split_store();
    store.set_remember_me(true);
    store.set_tokens("T1", Some("R1"));

    store.set_remember_me(false);
    store.set_tokens("T2", Some("R2"));

    assert_eq!(durable.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(durable.get(REFRESH_TOKEN_KEY), None);
    assert_eq!(ephemeral.get(ACCESS_TOKEN_KEY).as_deref(), Some("T2"));
    assert_eq!(store.token().as_deref(), Some("T2"));
}

#[test]
fn set_tokens_without_refresh_keeps_existing_refresh() {
    let (store, durable, ephemeral) = split_store();
    store.set_tokens("T1", Some("R1"));
    store.set_remember_me(false);
    store.set_tokens("T2", None);

    assert_eq!(store.refresh_token().as_deref(), Some("R1"));
    assert_eq!(ephemeral.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    assert_eq!(durable.get(REFRESH_TOKEN_KEY), None);
}

#[test]
fn reads_fall_back_to_other_backend() {
    let (store, durable, _) = split_store();
    durable.set(ACCESS_TOKEN_KEY, "legacy").unwrap();
    store.set_remember_me(false);
    assert_eq!(store.token().as_deref(), Some("legacy"));
}

// =============================================================================
// clearing
// =============================================================================

#[test]
fn clear_tokens_then_token_is_none_for_either_backend() {
    for remember in [true, false] {
        let (store, _, _) = split_store();
        store.set_remember_me(remember);
        store.set_tokens("T1", Some("R1"));
        store.clear_tokens();
        assert_eq!(store.token(), None, "remember_me={remember}");
        assert_eq!(store.refresh_token(), None, "remember_me={remember}");
    }
}

#[test]
fn clear_succeeds_after_flag_toggle() {
    let (store, durable, ephemeral) = split_store();
    store.set_remember_me(true);
    store.set_tokens("T1", Some("R1"));
    store.set_current_profile_id("p1");
    store.set_remember_me(false);

    store.clear_all();

    for backend in [&durable, &ephemeral] {
        assert_eq!(backend.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(backend.get(REFRESH_TOKEN_KEY), None);
        assert_eq!(backend.get(CURRENT_PROFILE_KEY), None);
    }
}

// =============================================================================
// current profile id
// =============================================================================

#[test]
fn profile_id_round_trip_and_clear() {
    let store = TokenStore::in_memory();
    assert_eq!(store.current_profile_id(), None);
    store.set_current_profile_id("p1");
    assert_eq!(store.current_profile_id().as_deref(), Some("p1"));
    store.clear_current_profile_id();
    assert_eq!(store.current_profile_id(), None);
}

#[test]
fn clear_tokens_leaves_profile_id() {
    let store = TokenStore::in_memory();
    store.set_tokens("T1", None);
    store.set_current_profile_id("p1");
    store.clear_tokens();
    assert_eq!(store.current_profile_id().as_deref(), Some("p1"));
}

// =============================================================================
// file-backed durable scope
// =============================================================================

#[test]
fn open_persists_remembered_tokens_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = TokenStore::open(dir.path()).unwrap();
        store.set_remember_me(true);
        store.set_tokens("T1", Some("R1"));
    }
    let store = TokenStore::open(dir.path()).unwrap();
    assert_eq!(store.token().as_deref(), Some("T1"));
    assert_eq!(store.refresh_token().as_deref(), Some("R1"));
}

#[test]
fn open_does_not_persist_session_only_tokens() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = TokenStore::open(dir.path()).unwrap();
        store.set_remember_me(false);
        store.set_tokens("T1", Some("R1"));
    }
    let store = TokenStore::open(dir.path()).unwrap();
    assert!(!store.remember_me());
    assert_eq!(store.token(), None);
}

#[test]
fn corrupt_session_file_reads_as_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(SESSION_FILE_NAME), b"{not json").unwrap();

    let store = TokenStore::open(dir.path()).unwrap();
    assert_eq!(store.token(), None);
    assert_eq!(store.refresh_token(), None);
    store.clear_all();

    store.set_tokens("T1", Some("R1"));
    let reopened = TokenStore::open(dir.path()).unwrap();
    assert_eq!(reopened.token().as_deref(), Some("T1"));
}

#[cfg(unix)]
#[test]
fn session_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::open(dir.path()).unwrap();
    store.set_tokens("T1", Some("R1"));

    let meta = std::fs::metadata(dir.path().join(SESSION_FILE_NAME)).unwrap();
    assert_eq!(meta.permissions().mode() & 0o777, 0o600);
}
