use std::collections::BTreeMap;

use uc_model::state_data::{StateData, StateName};
use uc_model::update_info::{ArtifactSource, RebootAction, RollbackSupport, UpdateInfo};

fn sample_update_info() -> UpdateInfo {
    UpdateInfo {
        id: "dep-1".into(),
        artifact_name: "release-42".into(),
        source: ArtifactSource { uri: "https://example.test/artifact.mender".into(), expire: None },
        payload_types: vec!["rootfs-image".into()],
        type_info_provides: BTreeMap::from([("rootfs-image.version".into(), "42".into())]),
        clears_artifact_provides: vec!["rootfs-image.*".into()],
        reboot_requested: vec![RebootAction::Automatic],
        supports_rollback: RollbackSupport::Yes,
        all_rollbacks_successful: false,
        has_db_schema_update: false,
    }
}

#[test]
fn save_then_load_produces_equal_record() {
    let original = StateData::new(StateName::ArtifactInstall, sample_update_info());
    let bytes = original.to_canonical_bytes().expect("encode");
    let reloaded = StateData::load_compatible(&bytes).expect("decode");
    assert_eq!(original, reloaded);
}

#[test]
fn canonical_encoding_is_deterministic() {
    let data = StateData::new(StateName::Cleanup, sample_update_info());
    let a = data.to_canonical_bytes().unwrap();
    let b = data.to_canonical_bytes().unwrap();
    assert_eq!(a, b);
}

#[test]
fn version_mismatch_is_rejected_not_upgraded() {
    let mut value = serde_json::to_value(StateData::new(StateName::Download, sample_update_info())).unwrap();
    value["version"] = serde_json::json!(1);
    let bytes = serde_json::to_vec(&value).unwrap();
    let err = StateData::load_compatible(&bytes).unwrap_err();
    match err {
        uc_model::error::ModelError::UnsupportedStateVersion { found, expected } => {
            assert_eq!(found, 1);
            assert_eq!(expected, uc_model::state_data::STATE_DATA_VERSION);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
