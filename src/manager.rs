use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::domain::{
    Component, Experiment, ExperimentComponent, ExperimentComponentUpdate, ExperimentUpdate,
    Project, ProjectUpdate,
};
use crate::error::ProjectsError;
use crate::models::{ExperimentChangeset, ExperimentComponentChangeset};
use crate::ordering::OrderingEngine;

/// Index a freshly created experiment is reordered to: new experiments
/// surface at the head of the project's list.
const NEW_EXPERIMENT_INDEX: usize = 0;

pub struct ProjectManager {
    database: Arc<DatabaseManager>,
    ordering: OrderingEngine,
}

impl ProjectManager {
    pub async fn new(database_url: &str) -> Result<Self, ProjectsError> {
        info!("Initializing project manager");
        let database = Arc::new(DatabaseManager::new(database_url).await?);
        let ordering = OrderingEngine::new(database.clone());

        Ok(Self { database, ordering })
    }

    pub async fn create_project(&self, name: Option<String>) -> Result<Project, ProjectsError> {
        let name = name.ok_or_else(|| ProjectsError::validation("name is required"))?;

        let project = Project {
            uuid: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        };
        self.database.insert_project(&project).await?;

        Ok(project)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, ProjectsError> {
        let rows = self.database.list_projects().await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    pub async fn get_project(&self, project_id: Uuid) -> Result<Project, ProjectsError> {
        let row = self.database.get_project(project_id).await?;
        row.map(Project::from).ok_or(ProjectsError::NotFound)
    }

    pub async fn update_project(
        &self,
        project_id: Uuid,
        update: ProjectUpdate,
    ) -> Result<Project, ProjectsError> {
        self.get_project(project_id).await?;

        if let Some(name) = update.name {
            self.database.update_project_name(project_id, &name).await?;
        }

        self.get_project(project_id).await
    }

    pub async fn create_experiment(
        &self,
        project_id: Uuid,
        name: Option<String>,
    ) -> Result<Experiment, ProjectsError> {
        let name = name.ok_or_else(|| ProjectsError::validation("name is required"))?;
        self.get_project(project_id).await?;

        if self
            .database
            .find_experiment_by_name(project_id, &name)
            .await?
            .is_some()
        {
            return Err(ProjectsError::validation(
                "an experiment with that name already exists",
            ));
        }

        let experiment = Experiment {
            uuid: Uuid::new_v4(),
            name,
            project_id,
            pipeline_id_train: None,
            pipeline_id_deploy: None,
            dataset_id: None,
            header_id: None,
            target_column_id: None,
            parameters: None,
            run_id: None,
            run_status: None,
            template: None,
            created_at: Utc::now(),
            position: None,
        };
        self.database.insert_experiment(&experiment).await?;

        self.ordering
            .reorder_experiment(project_id, experiment.uuid, NEW_EXPERIMENT_INDEX)
            .await?;

        let row = self
            .database
            .get_experiment(experiment.uuid)
            .await?
            .ok_or(ProjectsError::NotFound)?;
        Ok(Experiment::from(row))
    }

    pub async fn list_experiments(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Experiment>, ProjectsError> {
        let rows = self.database.list_experiments(project_id).await?;
        Ok(rows.into_iter().map(Experiment::from).collect())
    }

    pub async fn get_experiment(&self, experiment_id: Uuid) -> Result<Experiment, ProjectsError> {
        let row = self.database.get_experiment(experiment_id).await?;
        row.map(Experiment::from).ok_or(ProjectsError::NotFound)
    }

    pub async fn update_experiment(
        &self,
        experiment_id: Uuid,
        update: ExperimentUpdate,
    ) -> Result<Experiment, ProjectsError> {
        let current = self
            .database
            .get_experiment(experiment_id)
            .await?
            .ok_or(ProjectsError::NotFound)?;

        if let Some(name) = &update.name {
            if *name != current.name
                && self
                    .database
                    .find_experiment_by_name(current.project_id, name)
                    .await?
                    .is_some()
            {
                return Err(ProjectsError::validation(
                    "an experiment with that name already exists",
                ));
            }
        }

        let new_position = update.position;
        let changeset = ExperimentChangeset::from(update);
        if !changeset.is_empty() {
            self.database
                .update_experiment(experiment_id, &changeset)
                .await?;
        }

        if let Some(requested) = new_position {
            let new_index = requested.max(0) as usize;
            self.ordering
                .reorder_experiment(current.project_id, experiment_id, new_index)
                .await?;
        }

        let row = self
            .database
            .get_experiment(experiment_id)
            .await?
            .ok_or(ProjectsError::NotFound)?;
        Ok(Experiment::from(row))
    }

    pub async fn delete_experiment(&self, experiment_id: Uuid) -> Result<(), ProjectsError> {
        let current = self
            .database
            .get_experiment(experiment_id)
            .await?
            .ok_or(ProjectsError::NotFound)?;

        info!(
            "Deleting experiment {} from project {}",
            experiment_id, current.project_id
        );
        self.database
            .delete_components_of_experiment(experiment_id)
            .await?;
        self.database.delete_experiment(experiment_id).await?;

        self.ordering
            .compact_experiments(current.project_id)
            .await?;

        Ok(())
    }

    pub async fn create_experiment_component(
        &self,
        experiment_id: Uuid,
        component_id: Option<Uuid>,
        position: Option<i32>,
    ) -> Result<ExperimentComponent, ProjectsError> {
        let component_id =
            component_id.ok_or_else(|| ProjectsError::validation("componentId is required"))?;
        let position =
            position.ok_or_else(|| ProjectsError::validation("position is required"))?;

        self.get_experiment(experiment_id).await?;

        // The caller owns position coordination for pipeline components; the
        // supplied value is stored verbatim.
        let link = ExperimentComponent {
            uuid: Uuid::new_v4(),
            experiment_id,
            component_id,
            created_at: Utc::now(),
            position: Some(position),
        };
        self.database.insert_experiment_component(&link).await?;

        Ok(link)
    }

    pub async fn list_experiment_components(
        &self,
        experiment_id: Uuid,
    ) -> Result<Vec<ExperimentComponent>, ProjectsError> {
        let rows = self
            .database
            .list_experiment_components(experiment_id)
            .await?;
        Ok(rows.into_iter().map(ExperimentComponent::from).collect())
    }

    pub async fn get_experiment_component(
        &self,
        link_uuid: Uuid,
    ) -> Result<ExperimentComponent, ProjectsError> {
        let row = self.database.get_experiment_component(link_uuid).await?;
        row.map(ExperimentComponent::from)
            .ok_or(ProjectsError::NotFound)
    }

    pub async fn update_experiment_component(
        &self,
        link_uuid: Uuid,
        update: ExperimentComponentUpdate,
    ) -> Result<ExperimentComponent, ProjectsError> {
        self.get_experiment_component(link_uuid).await?;

        let changeset = ExperimentComponentChangeset::from(update);
        if !changeset.is_empty() {
            self.database
                .update_experiment_component(link_uuid, &changeset)
                .await?;
        }

        self.get_experiment_component(link_uuid).await
    }

    /// Deletes a pipeline component without renumbering its siblings; the
    /// positional gap persists until the caller reassigns positions.
    pub async fn delete_experiment_component(
        &self,
        link_uuid: Uuid,
    ) -> Result<(), ProjectsError> {
        self.get_experiment_component(link_uuid).await?;
        self.database.delete_experiment_component(link_uuid).await?;
        Ok(())
    }

    pub async fn create_component(
        &self,
        name: Option<String>,
        parameters: Option<serde_json::Value>,
    ) -> Result<Component, ProjectsError> {
        let name = name.ok_or_else(|| ProjectsError::validation("name is required"))?;

        let component = Component {
            uuid: Uuid::new_v4(),
            name,
            parameters,
            created_at: Utc::now(),
        };
        self.database.insert_component(&component).await?;

        Ok(component)
    }

    pub async fn list_components(&self) -> Result<Vec<Component>, ProjectsError> {
        let rows = self.database.list_components().await?;
        Ok(rows.into_iter().map(Component::from).collect())
    }

    pub async fn get_component(&self, component_id: Uuid) -> Result<Component, ProjectsError> {
        let row = self.database.get_component(component_id).await?;
        row.map(Component::from).ok_or(ProjectsError::NotFound)
    }
}
