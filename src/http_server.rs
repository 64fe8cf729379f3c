use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{
    Component, Experiment, ExperimentComponent, ExperimentComponentUpdate, ExperimentUpdate,
    Project, ProjectUpdate,
};
use crate::error::ProjectsError;
use crate::manager::ProjectManager;

pub struct HttpServer {
    manager: Arc<ProjectManager>,
}

impl HttpServer {
    pub fn new(manager: Arc<ProjectManager>) -> Self {
        Self { manager }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/projects", post(create_project).get(list_projects))
            .route(
                "/projects/:project_id",
                get(get_project).patch(update_project),
            )
            .route(
                "/projects/:project_id/experiments",
                post(create_experiment).get(list_experiments),
            )
            .route(
                "/projects/:project_id/experiments/:experiment_id",
                get(get_experiment)
                    .patch(update_experiment)
                    .delete(delete_experiment),
            )
            .route(
                "/experiments/:experiment_id/components",
                post(create_experiment_component).get(list_experiment_components),
            )
            .route(
                "/experiments/:experiment_id/components/:component_uuid",
                get(get_experiment_component)
                    .patch(update_experiment_component)
                    .delete(delete_experiment_component),
            )
            .route("/components", post(create_component).get(list_components))
            .route("/components/:component_id", get(get_component))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.manager.clone())
    }

    pub async fn start(&self, addr: SocketAddr) -> Result<(), ProjectsError> {
        info!("Starting HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MessageResponse<T> {
    message: String,
    payload: T,
}

#[derive(Debug, Serialize)]
struct PayloadResponse<T> {
    payload: T,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

impl IntoResponse for ProjectsError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProjectsError::NotFound | ProjectsError::Validation { .. } => StatusCode::BAD_REQUEST,
            ProjectsError::Storage { .. } | ProjectsError::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    name: Option<String>,
}

async fn create_project(
    State(manager): State<Arc<ProjectManager>>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Json<MessageResponse<Project>>, ProjectsError> {
    let project = manager.create_project(body.name).await?;
    Ok(Json(MessageResponse {
        message: "Project created successfully.".to_string(),
        payload: project,
    }))
}

async fn list_projects(
    State(manager): State<Arc<ProjectManager>>,
) -> Result<Json<PayloadResponse<Vec<Project>>>, ProjectsError> {
    let projects = manager.list_projects().await?;
    Ok(Json(PayloadResponse { payload: projects }))
}

async fn get_project(
    State(manager): State<Arc<ProjectManager>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<PayloadResponse<Project>>, ProjectsError> {
    let project = manager.get_project(project_id).await?;
    Ok(Json(PayloadResponse { payload: project }))
}

async fn update_project(
    State(manager): State<Arc<ProjectManager>>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<ProjectUpdate>,
) -> Result<Json<MessageResponse<Project>>, ProjectsError> {
    let project = manager.update_project(project_id, body).await?;
    Ok(Json(MessageResponse {
        message: "Project updated successfully.".to_string(),
        payload: project,
    }))
}

#[derive(Debug, Deserialize)]
struct CreateExperimentRequest {
    name: Option<String>,
}

async fn create_experiment(
    State(manager): State<Arc<ProjectManager>>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<CreateExperimentRequest>,
) -> Result<Json<MessageResponse<Experiment>>, ProjectsError> {
    let experiment = manager.create_experiment(project_id, body.name).await?;
    Ok(Json(MessageResponse {
        message: "Experiment created successfully.".to_string(),
        payload: experiment,
    }))
}

async fn list_experiments(
    State(manager): State<Arc<ProjectManager>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<PayloadResponse<Vec<Experiment>>>, ProjectsError> {
    let experiments = manager.list_experiments(project_id).await?;
    Ok(Json(PayloadResponse {
        payload: experiments,
    }))
}

async fn get_experiment(
    State(manager): State<Arc<ProjectManager>>,
    Path((_project_id, experiment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PayloadResponse<Experiment>>, ProjectsError> {
    let experiment = manager.get_experiment(experiment_id).await?;
    Ok(Json(PayloadResponse {
        payload: experiment,
    }))
}

async fn update_experiment(
    State(manager): State<Arc<ProjectManager>>,
    Path((_project_id, experiment_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ExperimentUpdate>,
) -> Result<Json<MessageResponse<Experiment>>, ProjectsError> {
    let experiment = manager.update_experiment(experiment_id, body).await?;
    Ok(Json(MessageResponse {
        message: "Experiment updated successfully.".to_string(),
        payload: experiment,
    }))
}

async fn delete_experiment(
    State(manager): State<Arc<ProjectManager>>,
    Path((_project_id, experiment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse<()>>, ProjectsError> {
    manager.delete_experiment(experiment_id).await?;
    Ok(Json(MessageResponse {
        message: "Experiment deleted successfully.".to_string(),
        payload: (),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateExperimentComponentRequest {
    component_id: Option<Uuid>,
    position: Option<i32>,
}

async fn create_experiment_component(
    State(manager): State<Arc<ProjectManager>>,
    Path(experiment_id): Path<Uuid>,
    Json(body): Json<CreateExperimentComponentRequest>,
) -> Result<Json<MessageResponse<ExperimentComponent>>, ProjectsError> {
    let link = manager
        .create_experiment_component(experiment_id, body.component_id, body.position)
        .await?;
    Ok(Json(MessageResponse {
        message: "Experiment component created successfully.".to_string(),
        payload: link,
    }))
}

async fn list_experiment_components(
    State(manager): State<Arc<ProjectManager>>,
    Path(experiment_id): Path<Uuid>,
) -> Result<Json<PayloadResponse<Vec<ExperimentComponent>>>, ProjectsError> {
    let links = manager.list_experiment_components(experiment_id).await?;
    Ok(Json(PayloadResponse { payload: links }))
}

async fn get_experiment_component(
    State(manager): State<Arc<ProjectManager>>,
    Path((_experiment_id, component_uuid)): Path<(Uuid, Uuid)>,
) -> Result<Json<PayloadResponse<ExperimentComponent>>, ProjectsError> {
    let link = manager.get_experiment_component(component_uuid).await?;
    Ok(Json(PayloadResponse { payload: link }))
}

async fn update_experiment_component(
    State(manager): State<Arc<ProjectManager>>,
    Path((_experiment_id, component_uuid)): Path<(Uuid, Uuid)>,
    Json(body): Json<ExperimentComponentUpdate>,
) -> Result<Json<MessageResponse<ExperimentComponent>>, ProjectsError> {
    let link = manager
        .update_experiment_component(component_uuid, body)
        .await?;
    Ok(Json(MessageResponse {
        message: "Experiment component updated successfully.".to_string(),
        payload: link,
    }))
}

async fn delete_experiment_component(
    State(manager): State<Arc<ProjectManager>>,
    Path((_experiment_id, component_uuid)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse<()>>, ProjectsError> {
    manager.delete_experiment_component(component_uuid).await?;
    Ok(Json(MessageResponse {
        message: "Experiment component deleted successfully.".to_string(),
        payload: (),
    }))
}

#[derive(Debug, Deserialize)]
struct CreateComponentRequest {
    name: Option<String>,
    parameters: Option<serde_json::Value>,
}

async fn create_component(
    State(manager): State<Arc<ProjectManager>>,
    Json(body): Json<CreateComponentRequest>,
) -> Result<Json<MessageResponse<Component>>, ProjectsError> {
    let component = manager.create_component(body.name, body.parameters).await?;
    Ok(Json(MessageResponse {
        message: "Component created successfully.".to_string(),
        payload: component,
    }))
}

async fn list_components(
    State(manager): State<Arc<ProjectManager>>,
) -> Result<Json<PayloadResponse<Vec<Component>>>, ProjectsError> {
    let components = manager.list_components().await?;
    Ok(Json(PayloadResponse {
        payload: components,
    }))
}

async fn get_component(
    State(manager): State<Arc<ProjectManager>>,
    Path(component_id): Path<Uuid>,
) -> Result<Json<PayloadResponse<Component>>, ProjectsError> {
    let component = manager.get_component(component_id).await?;
    Ok(Json(PayloadResponse { payload: component }))
}
