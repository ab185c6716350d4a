#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf, process};

    use crate::{BridgeConfig, Error, load_from_path, load_from_str, resolve_config_path};

    #[test]
    fn empty_source_yields_defaults() {
        let cfg = load_from_str("()").unwrap();
        assert_eq!(cfg, BridgeConfig::default());
        assert_eq!(cfg.default_volume, 50);
        assert_eq!(cfg.end_call_min_api, 28);
        assert!(!cfg.strict_permissions);
    }

    #[test]
    fn partial_override() {
        let cfg = load_from_str(
            r#"(strict_permissions: true, default_message_platform: "sms", not_found_sample: 3)"#,
        )
        .unwrap();
        assert!(cfg.strict_permissions);
        assert_eq!(cfg.default_message_platform, "sms");
        assert_eq!(cfg.not_found_sample, 3);
        assert_eq!(cfg.dnd_min_api, 23);
    }

    #[test]
    fn unknown_field_is_a_parse_error_with_location() {
        let err = load_from_str("(\n  volume: 3,\n)").unwrap_err();
        match &err {
            Error::Parse { line, excerpt, .. } => {
                assert_eq!(*line, 2);
                assert!(excerpt.contains("volume"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(err.pretty().starts_with("Config parse error at line 2"));
    }

    #[test]
    fn out_of_range_volume_fails_validation() {
        let err = load_from_str("(default_volume: 140)").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation {
                field: "default_volume",
                ..
            }
        ));
    }

    #[test]
    fn unknown_platform_fails_validation() {
        let err = load_from_str(r#"(default_message_platform: "pigeon")"#).unwrap_err();
        assert!(err.to_string().contains("pigeon"));
    }

    #[test]
    fn path_is_attached_to_file_errors() {
        let dir = env::temp_dir().join(format!("rexbridge-cfg-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.ron");
        fs::write(&path, "(default_volume: 101)").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert_eq!(err.path(), Some(path.as_path()));

        let missing = dir.join("missing.ron");
        assert!(matches!(
            load_from_path(&missing),
            Err(Error::Read { .. })
        ));
        let _ignored = fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_path_wins() {
        let p = PathBuf::from("/nonexistent/explicit.ron");
        assert_eq!(resolve_config_path(Some(&p)), Some(p.clone()));
    }

    #[test]
    fn config_round_trips_through_json_dump() {
        let json = serde_json::to_value(BridgeConfig::default()).unwrap();
        assert_eq!(json["default_message_platform"], "whatsapp");
    }
}
