use std::sync::Once;

use projects_service::domain::{Experiment, ExperimentUpdate, Patch};
use projects_service::{ProjectManager, ProjectsError};
use uuid::Uuid;

static INIT: Once = Once::new();

fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

async fn test_manager() -> Option<ProjectManager> {
    init_test_logging();

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping integration test");
        return None;
    };

    Some(
        ProjectManager::new(&database_url)
            .await
            .expect("Failed to initialize project manager"),
    )
}

fn positions(experiments: &[Experiment]) -> Vec<(String, Option<i32>)> {
    experiments
        .iter()
        .map(|e| (e.name.clone(), e.position))
        .collect()
}

#[tokio::test]
async fn test_created_experiments_surface_at_the_head_with_dense_positions() {
    let Some(manager) = test_manager().await else {
        return;
    };

    // Given: an empty project
    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Ordering test project {}", test_id)))
        .await
        .expect("Failed to create project");

    // When: three experiments are created one after another
    for name in ["first", "second", "third"] {
        manager
            .create_experiment(project.uuid, Some(format!("{} {}", name, test_id)))
            .await
            .expect("Failed to create experiment");
    }

    // Then: each newcomer took the head and the set stayed dense
    let experiments = manager
        .list_experiments(project.uuid)
        .await
        .expect("Failed to list experiments");
    assert_eq!(
        positions(&experiments),
        vec![
            (format!("third {}", test_id), Some(0)),
            (format!("second {}", test_id), Some(1)),
            (format!("first {}", test_id), Some(2)),
        ]
    );
}

#[tokio::test]
async fn test_created_experiment_round_trips_through_get() {
    let Some(manager) = test_manager().await else {
        return;
    };

    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Round trip project {}", test_id)))
        .await
        .expect("Failed to create project");

    let created = manager
        .create_experiment(project.uuid, Some(format!("round trip {}", test_id)))
        .await
        .expect("Failed to create experiment");

    let fetched = manager
        .get_experiment(created.uuid)
        .await
        .expect("Failed to fetch experiment");

    assert_eq!(fetched.uuid, created.uuid);
    assert_eq!(fetched.name, format!("round trip {}", test_id));
    assert_eq!(fetched.project_id, project.uuid);
    assert_eq!(fetched.position, Some(0));
    assert_eq!(fetched.dataset_id, None);
}

#[tokio::test]
async fn test_moving_the_last_experiment_to_the_head() {
    let Some(manager) = test_manager().await else {
        return;
    };

    // Given: a project listing [c, b, a] (creation order a, b, c)
    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Reorder project {}", test_id)))
        .await
        .expect("Failed to create project");
    for name in ["a", "b", "c"] {
        manager
            .create_experiment(project.uuid, Some(format!("{} {}", name, test_id)))
            .await
            .expect("Failed to create experiment");
    }

    let experiments = manager
        .list_experiments(project.uuid)
        .await
        .expect("Failed to list experiments");
    let last = experiments.last().unwrap().clone();
    assert_eq!(last.position, Some(2));

    // When: the tail experiment is moved to index 0
    manager
        .update_experiment(
            last.uuid,
            ExperimentUpdate {
                position: Some(0),
                ..ExperimentUpdate::default()
            },
        )
        .await
        .expect("Failed to reorder experiment");

    // Then: it leads the list and the others kept their relative order
    let experiments = manager
        .list_experiments(project.uuid)
        .await
        .expect("Failed to list experiments");
    assert_eq!(
        positions(&experiments),
        vec![
            (format!("a {}", test_id), Some(0)),
            (format!("c {}", test_id), Some(1)),
            (format!("b {}", test_id), Some(2)),
        ]
    );
}

#[tokio::test]
async fn test_out_of_range_position_clamps_to_the_tail() {
    let Some(manager) = test_manager().await else {
        return;
    };

    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Clamp project {}", test_id)))
        .await
        .expect("Failed to create project");

    let only = manager
        .create_experiment(project.uuid, Some(format!("solo {}", test_id)))
        .await
        .expect("Failed to create experiment");

    // A singleton stays at position 0 no matter what index is requested
    let updated = manager
        .update_experiment(
            only.uuid,
            ExperimentUpdate {
                position: Some(5),
                ..ExperimentUpdate::default()
            },
        )
        .await
        .expect("Failed to reorder experiment");
    assert_eq!(updated.position, Some(0));
}

#[tokio::test]
async fn test_update_without_position_keeps_the_stored_ordering() {
    let Some(manager) = test_manager().await else {
        return;
    };

    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Patch project {}", test_id)))
        .await
        .expect("Failed to create project");
    for name in ["x", "y"] {
        manager
            .create_experiment(project.uuid, Some(format!("{} {}", name, test_id)))
            .await
            .expect("Failed to create experiment");
    }

    let experiments = manager
        .list_experiments(project.uuid)
        .await
        .expect("Failed to list experiments");
    let tail = experiments.last().unwrap().clone();

    // When: a field is set and later cleared, with no position supplied
    let updated = manager
        .update_experiment(
            tail.uuid,
            ExperimentUpdate {
                dataset_id: Patch::Set("ds-42".to_string()),
                ..ExperimentUpdate::default()
            },
        )
        .await
        .expect("Failed to update experiment");
    assert_eq!(updated.dataset_id, Some("ds-42".to_string()));
    assert_eq!(updated.position, tail.position);

    let cleared = manager
        .update_experiment(
            tail.uuid,
            ExperimentUpdate {
                dataset_id: Patch::Clear,
                ..ExperimentUpdate::default()
            },
        )
        .await
        .expect("Failed to clear experiment field");
    assert_eq!(cleared.dataset_id, None);
    assert_eq!(cleared.position, tail.position);
}

#[tokio::test]
async fn test_deleting_an_experiment_compacts_the_survivors() {
    let Some(manager) = test_manager().await else {
        return;
    };

    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Compaction project {}", test_id)))
        .await
        .expect("Failed to create project");
    for name in ["a", "b", "c"] {
        manager
            .create_experiment(project.uuid, Some(format!("{} {}", name, test_id)))
            .await
            .expect("Failed to create experiment");
    }

    let experiments = manager
        .list_experiments(project.uuid)
        .await
        .expect("Failed to list experiments");
    let middle = experiments[1].clone();

    manager
        .delete_experiment(middle.uuid)
        .await
        .expect("Failed to delete experiment");

    let experiments = manager
        .list_experiments(project.uuid)
        .await
        .expect("Failed to list experiments");
    assert_eq!(experiments.len(), 2);
    assert_eq!(
        experiments.iter().map(|e| e.position).collect::<Vec<_>>(),
        vec![Some(0), Some(1)]
    );
    assert!(matches!(
        manager.get_experiment(middle.uuid).await,
        Err(ProjectsError::NotFound)
    ));
}

#[tokio::test]
async fn test_duplicate_experiment_names_are_rejected() {
    let Some(manager) = test_manager().await else {
        return;
    };

    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Name clash project {}", test_id)))
        .await
        .expect("Failed to create project");

    manager
        .create_experiment(project.uuid, Some(format!("clash {}", test_id)))
        .await
        .expect("Failed to create experiment");

    let result = manager
        .create_experiment(project.uuid, Some(format!("clash {}", test_id)))
        .await;
    assert!(matches!(result, Err(ProjectsError::Validation { .. })));
}

#[tokio::test]
async fn test_unknown_uuid_is_not_found_rather_than_storage_failure() {
    let Some(manager) = test_manager().await else {
        return;
    };

    let result = manager.get_experiment(Uuid::new_v4()).await;
    assert!(matches!(result, Err(ProjectsError::NotFound)));

    let result = manager.get_project(Uuid::new_v4()).await;
    assert!(matches!(result, Err(ProjectsError::NotFound)));
}

#[tokio::test]
async fn test_component_deletion_leaves_a_positional_gap() {
    let Some(manager) = test_manager().await else {
        return;
    };

    // Given: an experiment with three pipeline components at 0, 1, 2
    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Pipeline project {}", test_id)))
        .await
        .expect("Failed to create project");
    let experiment = manager
        .create_experiment(project.uuid, Some(format!("pipeline {}", test_id)))
        .await
        .expect("Failed to create experiment");

    let mut links = Vec::new();
    for index in 0..3 {
        let definition = manager
            .create_component(Some(format!("step {} {}", index, test_id)), None)
            .await
            .expect("Failed to create component definition");
        let link = manager
            .create_experiment_component(experiment.uuid, Some(definition.uuid), Some(index))
            .await
            .expect("Failed to create experiment component");
        links.push(link);
    }

    // When: the middle component is removed
    manager
        .delete_experiment_component(links[1].uuid)
        .await
        .expect("Failed to delete experiment component");

    // Then: the survivors keep positions 0 and 2; no renumbering happens
    let remaining = manager
        .list_experiment_components(experiment.uuid)
        .await
        .expect("Failed to list experiment components");
    assert_eq!(
        remaining.iter().map(|l| l.position).collect::<Vec<_>>(),
        vec![Some(0), Some(2)]
    );
}

#[tokio::test]
async fn test_component_create_requires_component_id_and_position() {
    let Some(manager) = test_manager().await else {
        return;
    };

    let test_id = Uuid::new_v4();
    let project = manager
        .create_project(Some(format!("Validation project {}", test_id)))
        .await
        .expect("Failed to create project");
    let experiment = manager
        .create_experiment(project.uuid, Some(format!("validation {}", test_id)))
        .await
        .expect("Failed to create experiment");

    let missing_position = manager
        .create_experiment_component(experiment.uuid, Some(Uuid::new_v4()), None)
        .await;
    assert!(matches!(
        missing_position,
        Err(ProjectsError::Validation { .. })
    ));

    let missing_component = manager
        .create_experiment_component(experiment.uuid, None, Some(0))
        .await;
    assert!(matches!(
        missing_component,
        Err(ProjectsError::Validation { .. })
    ));
}
