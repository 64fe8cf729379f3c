use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{
        deadpool::{Object, Pool},
        AsyncDieselConnectionManager,
    },
    AsyncPgConnection, RunQueryDsl,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;
use uuid::Uuid;

use crate::domain::{Component, Experiment, ExperimentComponent, Project};
use crate::error::ProjectsError;
use crate::models::*;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Clone)]
pub struct DatabaseManager {
    pool: Pool<AsyncPgConnection>,
}

impl DatabaseManager {
    pub async fn new(database_url: &str) -> Result<Self, ProjectsError> {
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(config)
            .build()
            .map_err(|e| ProjectsError::Config {
                message: format!("Failed to create database pool: {}", e),
            })?;

        let manager = Self { pool };
        manager.run_migrations(database_url).await?;

        Ok(manager)
    }

    pub async fn run_migrations(&self, database_url: &str) -> Result<(), ProjectsError> {
        use diesel::Connection;
        use diesel::PgConnection;

        // diesel_migrations does not support async connections yet, so the
        // migration pass runs over a short-lived synchronous connection.
        let mut connection =
            PgConnection::establish(database_url).map_err(|e| ProjectsError::Config {
                message: format!("Failed to establish connection for migrations: {}", e),
            })?;

        connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| ProjectsError::Config {
                message: format!("Failed to run migrations: {}", e),
            })?;

        Ok(())
    }

    async fn conn(&self) -> Result<Object<AsyncPgConnection>, ProjectsError> {
        self.pool.get().await.map_err(|e| ProjectsError::Storage {
            message: format!("Failed to get database connection: {}", e),
        })
    }

    pub async fn insert_project(&self, project: &Project) -> Result<(), ProjectsError> {
        use crate::schema::projects::dsl::*;
        info!("Inserting project {}", project.uuid);
        let mut conn = self.conn().await?;

        let new_project = NewProject {
            uuid: &project.uuid,
            name: &project.name,
            created_at: project.created_at,
        };

        diesel::insert_into(projects)
            .values(&new_project)
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to insert project: {}", e),
            })?;

        Ok(())
    }

    pub async fn get_project(&self, project_uuid: Uuid) -> Result<Option<ProjectRow>, ProjectsError> {
        use crate::schema::projects::dsl::*;
        let mut conn = self.conn().await?;

        projects
            .filter(uuid.eq(project_uuid))
            .get_result::<ProjectRow>(&mut conn)
            .await
            .optional()
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch project: {}", e),
            })
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectRow>, ProjectsError> {
        use crate::schema::projects::dsl::*;
        let mut conn = self.conn().await?;

        projects
            .order(created_at.desc())
            .get_results::<ProjectRow>(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch projects: {}", e),
            })
    }

    pub async fn update_project_name(
        &self,
        project_uuid: Uuid,
        new_name: &str,
    ) -> Result<(), ProjectsError> {
        use crate::schema::projects::dsl::*;
        let mut conn = self.conn().await?;

        diesel::update(projects.filter(uuid.eq(project_uuid)))
            .set(name.eq(new_name))
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to update project: {}", e),
            })?;

        Ok(())
    }

    pub async fn insert_experiment(&self, experiment: &Experiment) -> Result<(), ProjectsError> {
        use crate::schema::experiments::dsl::*;
        info!(
            "Inserting experiment {} into project {}",
            experiment.uuid, experiment.project_id
        );
        let mut conn = self.conn().await?;

        let new_experiment = NewExperiment {
            uuid: &experiment.uuid,
            name: &experiment.name,
            project_id: &experiment.project_id,
            created_at: experiment.created_at,
        };

        diesel::insert_into(experiments)
            .values(&new_experiment)
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to insert experiment: {}", e),
            })?;

        Ok(())
    }

    pub async fn get_experiment(
        &self,
        experiment_uuid: Uuid,
    ) -> Result<Option<ExperimentRow>, ProjectsError> {
        use crate::schema::experiments::dsl::*;
        let mut conn = self.conn().await?;

        experiments
            .filter(uuid.eq(experiment_uuid))
            .get_result::<ExperimentRow>(&mut conn)
            .await
            .optional()
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch experiment: {}", e),
            })
    }

    pub async fn list_experiments(
        &self,
        project: Uuid,
    ) -> Result<Vec<ExperimentRow>, ProjectsError> {
        use crate::schema::experiments::dsl::*;
        let mut conn = self.conn().await?;

        experiments
            .filter(project_id.eq(project))
            .order((position.asc(), created_at.asc()))
            .get_results::<ExperimentRow>(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch experiments: {}", e),
            })
    }

    /// Sibling set used by the ordering engine: rows that have not been
    /// assigned a position yet are excluded.
    pub async fn list_positioned_experiments(
        &self,
        project: Uuid,
    ) -> Result<Vec<ExperimentRow>, ProjectsError> {
        use crate::schema::experiments::dsl::*;
        let mut conn = self.conn().await?;

        experiments
            .filter(project_id.eq(project))
            .filter(position.is_not_null())
            .order(position.asc())
            .get_results::<ExperimentRow>(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch positioned experiments: {}", e),
            })
    }

    pub async fn find_experiment_by_name(
        &self,
        project: Uuid,
        experiment_name: &str,
    ) -> Result<Option<ExperimentRow>, ProjectsError> {
        use crate::schema::experiments::dsl::*;
        let mut conn = self.conn().await?;

        experiments
            .filter(project_id.eq(project))
            .filter(name.eq(experiment_name))
            .first::<ExperimentRow>(&mut conn)
            .await
            .optional()
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch experiment by name: {}", e),
            })
    }

    pub async fn update_experiment(
        &self,
        experiment_uuid: Uuid,
        changeset: &ExperimentChangeset,
    ) -> Result<(), ProjectsError> {
        use crate::schema::experiments::dsl::*;
        let mut conn = self.conn().await?;

        diesel::update(experiments.filter(uuid.eq(experiment_uuid)))
            .set(changeset)
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to update experiment: {}", e),
            })?;

        Ok(())
    }

    pub async fn set_experiment_position(
        &self,
        experiment_uuid: Uuid,
        new_position: i32,
    ) -> Result<(), ProjectsError> {
        use crate::schema::experiments::dsl::*;
        let mut conn = self.conn().await?;

        diesel::update(experiments.filter(uuid.eq(experiment_uuid)))
            .set(position.eq(new_position))
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to update experiment position: {}", e),
            })?;

        Ok(())
    }

    pub async fn delete_experiment(&self, experiment_uuid: Uuid) -> Result<usize, ProjectsError> {
        use crate::schema::experiments::dsl::*;
        let mut conn = self.conn().await?;

        diesel::delete(experiments.filter(uuid.eq(experiment_uuid)))
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to delete experiment: {}", e),
            })
    }

    pub async fn insert_experiment_component(
        &self,
        link: &ExperimentComponent,
    ) -> Result<(), ProjectsError> {
        use crate::schema::experiment_components::dsl::*;
        info!(
            "Inserting component {} into experiment {}",
            link.component_id, link.experiment_id
        );
        let mut conn = self.conn().await?;

        let new_link = NewExperimentComponent {
            uuid: &link.uuid,
            experiment_id: &link.experiment_id,
            component_id: &link.component_id,
            created_at: link.created_at,
            position: link.position,
        };

        diesel::insert_into(experiment_components)
            .values(&new_link)
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to insert experiment component: {}", e),
            })?;

        Ok(())
    }

    pub async fn get_experiment_component(
        &self,
        link_uuid: Uuid,
    ) -> Result<Option<ExperimentComponentRow>, ProjectsError> {
        use crate::schema::experiment_components::dsl::*;
        let mut conn = self.conn().await?;

        experiment_components
            .filter(uuid.eq(link_uuid))
            .get_result::<ExperimentComponentRow>(&mut conn)
            .await
            .optional()
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch experiment component: {}", e),
            })
    }

    pub async fn list_experiment_components(
        &self,
        experiment: Uuid,
    ) -> Result<Vec<ExperimentComponentRow>, ProjectsError> {
        use crate::schema::experiment_components::dsl::*;
        let mut conn = self.conn().await?;

        experiment_components
            .filter(experiment_id.eq(experiment))
            .order((position.asc(), created_at.asc()))
            .get_results::<ExperimentComponentRow>(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch experiment components: {}", e),
            })
    }

    pub async fn update_experiment_component(
        &self,
        link_uuid: Uuid,
        changeset: &ExperimentComponentChangeset,
    ) -> Result<(), ProjectsError> {
        use crate::schema::experiment_components::dsl::*;
        let mut conn = self.conn().await?;

        diesel::update(experiment_components.filter(uuid.eq(link_uuid)))
            .set(changeset)
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to update experiment component: {}", e),
            })?;

        Ok(())
    }

    pub async fn delete_experiment_component(
        &self,
        link_uuid: Uuid,
    ) -> Result<usize, ProjectsError> {
        use crate::schema::experiment_components::dsl::*;
        let mut conn = self.conn().await?;

        diesel::delete(experiment_components.filter(uuid.eq(link_uuid)))
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to delete experiment component: {}", e),
            })
    }

    pub async fn delete_components_of_experiment(
        &self,
        experiment: Uuid,
    ) -> Result<usize, ProjectsError> {
        use crate::schema::experiment_components::dsl::*;
        let mut conn = self.conn().await?;

        diesel::delete(experiment_components.filter(experiment_id.eq(experiment)))
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to delete experiment components: {}", e),
            })
    }

    pub async fn insert_component(&self, component: &Component) -> Result<(), ProjectsError> {
        use crate::schema::components::dsl::*;
        info!("Inserting component definition {}", component.uuid);
        let mut conn = self.conn().await?;

        let new_component = NewComponent {
            uuid: &component.uuid,
            name: &component.name,
            parameters: component.parameters.as_ref(),
            created_at: component.created_at,
        };

        diesel::insert_into(components)
            .values(&new_component)
            .execute(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to insert component: {}", e),
            })?;

        Ok(())
    }

    pub async fn get_component(
        &self,
        component_uuid: Uuid,
    ) -> Result<Option<ComponentRow>, ProjectsError> {
        use crate::schema::components::dsl::*;
        let mut conn = self.conn().await?;

        components
            .filter(uuid.eq(component_uuid))
            .get_result::<ComponentRow>(&mut conn)
            .await
            .optional()
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch component: {}", e),
            })
    }

    pub async fn list_components(&self) -> Result<Vec<ComponentRow>, ProjectsError> {
        use crate::schema::components::dsl::*;
        let mut conn = self.conn().await?;

        components
            .order(created_at.desc())
            .get_results::<ComponentRow>(&mut conn)
            .await
            .map_err(|e| ProjectsError::Storage {
                message: format!("Failed to fetch components: {}", e),
            })
    }
}
