use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub uuid: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
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

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentComponent {
    pub uuid: Uuid,
    pub experiment_id: Uuid,
    pub component_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub uuid: Uuid,
    pub name: String,
    pub parameters: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Tri-state update field: an omitted JSON field keeps the stored value,
/// an explicit `null` clears it, and a concrete value replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// Maps to the diesel changeset convention: `None` skips the column,
    /// `Some(None)` writes NULL, `Some(Some(v))` writes the value.
    pub fn into_field(self) -> Option<Option<T>> {
        match self {
            Patch::Keep => None,
            Patch::Clear => Some(None),
            Patch::Set(value) => Some(Some(value)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperimentUpdate {
    pub name: Option<String>,
    pub pipeline_id_train: Patch<String>,
    pub pipeline_id_deploy: Patch<String>,
    pub dataset_id: Patch<String>,
    pub header_id: Patch<String>,
    pub target_column_id: Patch<String>,
    pub parameters: Patch<serde_json::Value>,
    pub run_id: Patch<String>,
    pub run_status: Patch<String>,
    pub template: Patch<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperimentComponentUpdate {
    pub experiment_id: Option<Uuid>,
    pub component_id: Option<Uuid>,
    pub position: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_omitted_null_and_value() {
        let update: ExperimentUpdate = serde_json::from_str(
            r#"{"name": "tuned", "datasetId": null, "targetColumnId": "col-7"}"#,
        )
        .unwrap();

        assert_eq!(update.name, Some("tuned".to_string()));
        assert_eq!(update.dataset_id, Patch::Clear);
        assert_eq!(update.target_column_id, Patch::Set("col-7".to_string()));
        assert_eq!(update.pipeline_id_train, Patch::Keep);
        assert_eq!(update.position, None);
    }

    #[test]
    fn patch_accepts_empty_string_and_zero() {
        let update: ExperimentUpdate =
            serde_json::from_str(r#"{"runStatus": "", "position": 0}"#).unwrap();

        assert_eq!(update.run_status, Patch::Set(String::new()));
        assert_eq!(update.position, Some(0));
    }

    #[test]
    fn patch_maps_to_changeset_fields() {
        assert_eq!(Patch::<String>::Keep.into_field(), None);
        assert_eq!(Patch::<String>::Clear.into_field(), Some(None));
        assert_eq!(
            Patch::Set("x".to_string()).into_field(),
            Some(Some("x".to_string()))
        );
    }

    #[test]
    fn null_position_does_not_request_a_reorder() {
        let update: ExperimentUpdate = serde_json::from_str(r#"{"position": null}"#).unwrap();
        assert_eq!(update.position, None);
    }
}
