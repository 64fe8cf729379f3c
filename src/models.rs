use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Component, Experiment, ExperimentComponent, ExperimentComponentUpdate, ExperimentUpdate,
    Project,
};
use crate::schema::{components, experiment_components, experiments, projects};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = projects)]
#[diesel(primary_key(uuid))]
pub struct ProjectRow {
    pub uuid: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject<'a> {
    pub uuid: &'a Uuid,
    pub name: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = experiments)]
#[diesel(belongs_to(ProjectRow, foreign_key = project_id))]
#[diesel(primary_key(uuid))]
pub struct ExperimentRow {
    pub uuid: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub pipeline_id_train: Option<String>,
    pub pipeline_id_deploy: Option<String>,
    pub dataset_id: Option<String>,
    pub header_id: Option<String>,
    pub target_column_id: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub run_id: Option<String>,
    pub run_status: Option<String>,
    pub template: Option<String>,
    pub created_at: DateTime<Utc>,
    pub position: Option<i32>,
}

// Experiments are inserted without a position; the ordering engine assigns
// one right after the insert.
#[derive(Insertable)]
#[diesel(table_name = experiments)]
pub struct NewExperiment<'a> {
    pub uuid: &'a Uuid,
    pub name: &'a str,
    pub project_id: &'a Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = experiments)]
pub struct ExperimentChangeset {
    pub name: Option<String>,
    pub pipeline_id_train: Option<Option<String>>,
    pub pipeline_id_deploy: Option<Option<String>>,
    pub dataset_id: Option<Option<String>>,
    pub header_id: Option<Option<String>>,
    pub target_column_id: Option<Option<String>>,
    pub parameters: Option<Option<serde_json::Value>>,
    pub run_id: Option<Option<String>>,
    pub run_status: Option<Option<String>>,
    pub template: Option<Option<String>>,
}

impl ExperimentChangeset {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.pipeline_id_train.is_none()
            && self.pipeline_id_deploy.is_none()
            && self.dataset_id.is_none()
            && self.header_id.is_none()
            && self.target_column_id.is_none()
            && self.parameters.is_none()
            && self.run_id.is_none()
            && self.run_status.is_none()
            && self.template.is_none()
    }
}

impl From<ExperimentUpdate> for ExperimentChangeset {
    fn from(update: ExperimentUpdate) -> Self {
        ExperimentChangeset {
            name: update.name,
            pipeline_id_train: update.pipeline_id_train.into_field(),
            pipeline_id_deploy: update.pipeline_id_deploy.into_field(),
            dataset_id: update.dataset_id.into_field(),
            header_id: update.header_id.into_field(),
            target_column_id: update.target_column_id.into_field(),
            parameters: update.parameters.into_field(),
            run_id: update.run_id.into_field(),
            run_status: update.run_status.into_field(),
            template: update.template.into_field(),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = experiment_components)]
#[diesel(belongs_to(ExperimentRow, foreign_key = experiment_id))]
#[diesel(primary_key(uuid))]
pub struct ExperimentComponentRow {
    pub uuid: Uuid,
    pub experiment_id: Uuid,
    pub component_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub position: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = experiment_components)]
pub struct NewExperimentComponent<'a> {
    pub uuid: &'a Uuid,
    pub experiment_id: &'a Uuid,
    pub component_id: &'a Uuid,
    pub created_at: DateTime<Utc>,
    pub position: Option<i32>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = experiment_components)]
pub struct ExperimentComponentChangeset {
    pub experiment_id: Option<Uuid>,
    pub component_id: Option<Uuid>,
    pub position: Option<i32>,
}

impl ExperimentComponentChangeset {
    pub fn is_empty(&self) -> bool {
        self.experiment_id.is_none() && self.component_id.is_none() && self.position.is_none()
    }
}

impl From<ExperimentComponentUpdate> for ExperimentComponentChangeset {
    fn from(update: ExperimentComponentUpdate) -> Self {
        ExperimentComponentChangeset {
            experiment_id: update.experiment_id,
            component_id: update.component_id,
            position: update.position,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = components)]
#[diesel(primary_key(uuid))]
pub struct ComponentRow {
    pub uuid: Uuid,
    pub name: String,
    pub parameters: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = components)]
pub struct NewComponent<'a> {
    pub uuid: &'a Uuid,
    pub name: &'a str,
    pub parameters: Option<&'a serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            uuid: row.uuid,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<ExperimentRow> for Experiment {
    fn from(row: ExperimentRow) -> Self {
        Experiment {
            uuid: row.uuid,
            name: row.name,
            project_id: row.project_id,
            pipeline_id_train: row.pipeline_id_train,
            pipeline_id_deploy: row.pipeline_id_deploy,
            dataset_id: row.dataset_id,
            header_id: row.header_id,
            target_column_id: row.target_column_id,
            parameters: row.parameters,
            run_id: row.run_id,
            run_status: row.run_status,
            template: row.template,
            created_at: row.created_at,
            position: row.position,
        }
    }
}

impl From<ExperimentComponentRow> for ExperimentComponent {
    fn from(row: ExperimentComponentRow) -> Self {
        ExperimentComponent {
            uuid: row.uuid,
            experiment_id: row.experiment_id,
            component_id: row.component_id,
            created_at: row.created_at,
            position: row.position,
        }
    }
}

impl From<ComponentRow> for Component {
    fn from(row: ComponentRow) -> Self {
        Component {
            uuid: row.uuid,
            name: row.name,
            parameters: row.parameters,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Patch;

    #[test]
    fn changeset_from_update_skips_omitted_fields() {
        let update = ExperimentUpdate {
            name: Some("renamed".to_string()),
            dataset_id: Patch::Clear,
            target_column_id: Patch::Set("col-1".to_string()),
            ..ExperimentUpdate::default()
        };

        let changeset = ExperimentChangeset::from(update);
        assert_eq!(changeset.name, Some("renamed".to_string()));
        assert_eq!(changeset.dataset_id, Some(None));
        assert_eq!(changeset.target_column_id, Some(Some("col-1".to_string())));
        assert_eq!(changeset.pipeline_id_train, None);
        assert!(!changeset.is_empty());
    }

    #[test]
    fn empty_update_yields_empty_changeset() {
        let changeset = ExperimentChangeset::from(ExperimentUpdate::default());
        assert!(changeset.is_empty());
    }
}
