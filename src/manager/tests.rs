//! Tests for the environment manager

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::Error;
    use crate::repository::{MockRepository, RepositoryCall};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn manager_with_database_configs() -> EnvironmentManager {
        let mut manager = EnvironmentManager::new();
        manager.add_environment("dev").unwrap();
        manager.add_environment("prod").unwrap();
        manager
            .add_configuration("dev", "database", json!({"url": "localhost", "port": 5432}))
            .unwrap();
        manager
            .add_configuration(
                "prod",
                "database",
                json!({"url": "prod.db.com", "port": 5432}),
            )
            .unwrap();
        manager
    }

    #[test]
    fn test_add_and_list_environments() {
        let mut manager = EnvironmentManager::new();
        manager.add_environment("development").unwrap();
        manager.add_environment("production").unwrap();

        let mut names = manager.list_environments();
        names.sort();
        assert_eq!(names, vec!["development", "production"]);
    }

    #[test]
    fn test_duplicate_environment_reports_already_exists() {
        let mut manager = EnvironmentManager::new();
        manager.add_environment("development").unwrap();

        let result = manager.add_environment("development");

        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(manager.list_environments().len(), 1);
    }

    #[test]
    fn test_remove_missing_environment_is_not_found_and_non_destructive() {
        let mut manager = manager_with_database_configs();

        let result = manager.remove_environment("staging");

        assert!(matches!(result, Err(Error::NotFound(_))));
        // Existing environments are untouched
        let mut names = manager.list_environments();
        names.sort();
        assert_eq!(names, vec!["dev", "prod"]);
        assert!(manager.configuration("dev", "database").is_ok());
    }

    #[test]
    fn test_remove_environment_drops_its_configurations() {
        let mut manager = manager_with_database_configs();

        manager.remove_environment("dev").unwrap();

        assert!(matches!(
            manager.configuration("dev", "database"),
            Err(Error::NotFound(_))
        ));
        assert_eq!(manager.list_environments(), vec!["prod"]);
    }

    #[test]
    fn test_compare_database_between_dev_and_prod() {
        let manager = manager_with_database_configs();

        let report = manager
            .compare_configurations("dev", "prod", "database")
            .unwrap();

        assert_eq!(report.left_env, "dev");
        assert_eq!(report.right_env, "prod");
        assert_eq!(report.left_value, json!({"url": "localhost", "port": 5432}));
        assert_eq!(
            report.right_value,
            json!({"url": "prod.db.com", "port": 5432})
        );

        // Exactly one differing field: url. The matching port is absent.
        assert_eq!(report.differences.len(), 1);
        let entry = &report.differences["url"];
        assert_eq!(entry.left, Some(json!("localhost")));
        assert_eq!(entry.right, Some(json!("prod.db.com")));
    }

    #[test]
    fn test_compare_is_symmetric_in_key_set() {
        let manager = manager_with_database_configs();

        let forward = manager
            .compare_configurations("dev", "prod", "database")
            .unwrap();
        let backward = manager
            .compare_configurations("prod", "dev", "database")
            .unwrap();

        let forward_keys: Vec<&String> = forward.differences.keys().collect();
        let backward_keys: Vec<&String> = backward.differences.keys().collect();
        assert_eq!(forward_keys, backward_keys);

        for (key, entry) in &forward.differences {
            assert_eq!(entry.left, backward.differences[key].right);
            assert_eq!(entry.right, backward.differences[key].left);
        }
    }

    #[test]
    fn test_compare_does_not_mutate_either_side() {
        let manager = manager_with_database_configs();

        manager
            .compare_configurations("dev", "prod", "database")
            .unwrap();

        assert_eq!(manager.configuration("dev", "database").unwrap().version(), 1);
        assert_eq!(
            manager.configuration("prod", "database").unwrap().version(),
            1
        );
    }

    #[test]
    fn test_compare_with_missing_environment_reports_not_found() {
        let manager = manager_with_database_configs();

        let result = manager.compare_configurations("dev", "staging", "database");

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_compare_with_missing_configuration_reports_not_found() {
        let mut manager = manager_with_database_configs();
        manager.delete_configuration("prod", "database").unwrap();

        let result = manager.compare_configurations("dev", "prod", "database");

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_export_snapshot_is_value_only() {
        let mut manager = manager_with_database_configs();
        // Bump a version so there is metadata to lose
        manager
            .update_configuration("dev", "database", json!({"url": "localhost", "port": 5433}))
            .unwrap();

        let snapshot = manager.export_snapshot();

        assert_eq!(
            snapshot["dev"]["database"],
            json!({"url": "localhost", "port": 5433})
        );
        assert_eq!(
            snapshot["prod"]["database"],
            json!({"url": "prod.db.com", "port": 5432})
        );
    }

    #[test]
    fn test_export_import_round_trips_into_fresh_manager() {
        let manager = manager_with_database_configs();
        let snapshot = manager.export_snapshot();

        let mut fresh = EnvironmentManager::new();
        fresh.import_snapshot(snapshot).unwrap();

        for env in ["dev", "prod"] {
            let original = manager.configuration(env, "database").unwrap();
            let imported = fresh.configuration(env, "database").unwrap();
            assert_eq!(imported.value(), original.value());
            // Metadata is not restored: imported entries start over at 1
            assert_eq!(imported.version(), 1);
        }
    }

    #[test]
    fn test_import_never_overwrites_existing_configurations() {
        let mut manager = manager_with_database_configs();
        manager
            .update_configuration("dev", "database", json!({"url": "localhost", "port": 5433}))
            .unwrap();

        let mut snapshot = Snapshot::new();
        let mut configs = BTreeMap::new();
        configs.insert("database".to_string(), json!({"url": "elsewhere"}));
        configs.insert("cache".to_string(), json!({"ttl": 60}));
        snapshot.insert("dev".to_string(), configs);

        manager.import_snapshot(snapshot).unwrap();

        // Existing entry kept its value and version
        let database = manager.configuration("dev", "database").unwrap();
        assert_eq!(database.value(), &json!({"url": "localhost", "port": 5433}));
        assert_eq!(database.version(), 2);
        // The new entry was added at version 1
        assert_eq!(manager.configuration("dev", "cache").unwrap().version(), 1);
    }

    #[test]
    fn test_import_creates_missing_environments() {
        let mut manager = EnvironmentManager::new();

        let mut snapshot = Snapshot::new();
        let mut configs = BTreeMap::new();
        configs.insert("database".to_string(), json!({"port": 5432}));
        snapshot.insert("staging".to_string(), configs);

        manager.import_snapshot(snapshot).unwrap();

        assert_eq!(manager.list_environments(), vec!["staging"]);
        assert_eq!(
            manager.configuration("staging", "database").unwrap().value(),
            &json!({"port": 5432})
        );
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("configurations.json");

        let manager = manager_with_database_configs();
        manager.export_to_file(&path).unwrap();

        // Plain UTF-8 JSON, env → config → value, no envelope
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["dev"]["database"]["url"], json!("localhost"));
        assert!(raw["dev"]["database"].get("version").is_none());

        let mut fresh = EnvironmentManager::new();
        fresh.import_from_file(&path).unwrap();
        assert_eq!(
            fresh.configuration("prod", "database").unwrap().value(),
            &json!({"url": "prod.db.com", "port": 5432})
        );
    }

    #[test]
    fn test_import_from_missing_file_reports_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = EnvironmentManager::new();

        let result = manager.import_from_file(&temp_dir.path().join("missing.json"));

        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_state_file_preserves_version_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut manager = manager_with_database_configs();
        manager
            .update_configuration("dev", "database", json!({"url": "localhost", "port": 5433}))
            .unwrap();
        manager.save_state(&path).unwrap();

        let restored = EnvironmentManager::load_or_create(&path).unwrap();
        let database = restored.configuration("dev", "database").unwrap();
        assert_eq!(database.version(), 2);
        assert_eq!(database.value(), &json!({"url": "localhost", "port": 5433}));
    }

    #[test]
    fn test_load_or_create_starts_empty_without_a_file() {
        let temp_dir = TempDir::new().unwrap();

        let manager =
            EnvironmentManager::load_or_create(&temp_dir.path().join("store.json")).unwrap();

        assert!(manager.list_environments().is_empty());
    }

    #[tokio::test]
    async fn test_commit_writes_snapshot_before_delegating() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot_path = temp_dir.path().join("configurations.json");

        let mock = Arc::new(MockRepository::new());
        let manager = manager_with_database_configs()
            .with_repository(mock.clone(), Some(snapshot_path.clone()));

        manager.commit_changes("update database config").await.unwrap();

        // Snapshot captured before handing off
        assert!(snapshot_path.exists());
        assert_eq!(
            mock.calls().await,
            vec![RepositoryCall::Commit {
                message: "update database config".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_push_and_pull_delegate_to_collaborator() {
        let mock = Arc::new(MockRepository::new());
        let manager = manager_with_database_configs().with_repository(mock.clone(), None);

        manager.push_changes("origin", "main").await.unwrap();
        manager.pull_changes("origin", "main").await.unwrap();

        assert_eq!(
            mock.calls().await,
            vec![
                RepositoryCall::Push {
                    remote: "origin".to_string(),
                    branch: "main".to_string()
                },
                RepositoryCall::Pull {
                    remote: "origin".to_string(),
                    branch: "main".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_collaborator_failure_surfaces_as_persistence_error() {
        let mock = Arc::new(MockRepository::new());
        mock.queue_failure("remote rejected push").await;
        let manager = manager_with_database_configs().with_repository(mock, None);

        let result = manager.push_changes("origin", "main").await;

        match result {
            Err(Error::Persistence(e)) => {
                assert!(e.to_string().contains("remote rejected push"));
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_commit_without_repository_is_a_persistence_error() {
        let manager = manager_with_database_configs();

        let result = manager.commit_changes("no collaborator").await;

        assert!(matches!(result, Err(Error::Persistence(_))));
    }
}
