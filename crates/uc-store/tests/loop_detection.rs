use std::collections::BTreeMap;

use uc_store::{ProvidesStore, SledStore, StateStore, StoreError};
use uc_model::state_data::{StateData, StateName};
use uc_model::update_info::{ArtifactSource, RebootAction, RollbackSupport, UpdateInfo};

fn update_info() -> UpdateInfo {
    UpdateInfo {
        id: "dep-1".into(),
        artifact_name: "release-7".into(),
        source: ArtifactSource { uri: "https://example.test/a.mender".into(), expire: None },
        payload_types: vec!["rootfs-image".into()],
        type_info_provides: BTreeMap::from([("rootfs-image.version".into(), "7".into())]),
        clears_artifact_provides: vec!["rootfs-image.*".into()],
        reboot_requested: vec![RebootAction::No],
        supports_rollback: RollbackSupport::No,
        all_rollbacks_successful: false,
        has_db_schema_update: false,
    }
}

#[test]
fn exceeding_write_cap_trips_loop_detector_without_writing() {
    let kv = SledStore::open_temporary().unwrap();
    let store = StateStore::new(kv, 3);
    let data = StateData::new(StateName::Download, update_info());
    store.begin_deployment(&data).unwrap(); // count = 1
    store.save(&data).unwrap(); // count = 2
    store.save(&data).unwrap(); // count = 3, at cap
    let err = store.save(&data).unwrap_err();
    assert!(matches!(err, StoreError::StateDataStoreCountExceeded { cap: 3 }));
    // The rejected write must not have landed.
    assert_eq!(store.write_count().unwrap(), 3);
}

#[test]
fn clear_removes_state_and_resets_counter() {
    let kv = SledStore::open_temporary().unwrap();
    let store = StateStore::new(kv, 30);
    let data = StateData::new(StateName::Cleanup, update_info());
    store.begin_deployment(&data).unwrap();
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    assert_eq!(store.write_count().unwrap(), 0);
}

#[test]
fn provides_commit_unions_and_clears_matching_patterns() {
    let kv = SledStore::open_temporary().unwrap();
    let provides = ProvidesStore::new(kv.clone());
    let state = StateStore::new(kv, 30);
    let mut info = update_info();
    info.type_info_provides.insert("rootfs-image.checksum".into(), "abc".into());

    let data = StateData::new(StateName::ArtifactCommit, info.clone());
    state.begin_deployment(&data).unwrap();

    provides.commit_success(&info).unwrap();

    let record = provides.load().unwrap();
    assert_eq!(record.artifact_name, "release-7");
    assert_eq!(record.provides.get("rootfs-image.version").map(String::as_str), Some("7"));
    assert!(state.load().unwrap().is_none(), "state data must be cleared atomically with the provides commit");
}

#[test]
fn inconsistent_marker_is_idempotent() {
    let kv = SledStore::open_temporary().unwrap();
    let provides = ProvidesStore::new(kv);
    provides.commit_inconsistent().unwrap();
    provides.commit_inconsistent().unwrap();
    let record = provides.load().unwrap();
    assert_eq!(record.artifact_name.matches("_INCONSISTENT").count(), 1);
}
