use crate::{
    error::DailiesResult,
    tracking::{
        EntityType, RecordId, TrackingBackend, TrackingConfig, TrackingKind, VersionContext,
        first_record_id, http_get, http_post,
    },
};

/// Kitsu backend over its `/data` REST API.
///
/// Kitsu keys everything by UUID and exposes typed collections under
/// `/data/shots`, `/data/assets` and `/data/sequences`; name comparison on
/// the Kitsu side is lowercase.
pub struct KitsuTracking {
    config: TrackingConfig,
}

impl KitsuTracking {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    fn find(&self, path: &str) -> DailiesResult<Option<RecordId>> {
        let client = self.config.http_client()?;
        let url = format!("{}/{path}", self.config.api_url);
        let body = http_get(&client, &url, &self.config.api_token)?;
        // Kitsu list endpoints return a bare array rather than a data wrapper.
        if let serde_json::Value::Array(items) = &body {
            return Ok(items.first().and_then(crate::tracking::record_id));
        }
        Ok(first_record_id(&body))
    }
}

impl TrackingBackend for KitsuTracking {
    fn kind(&self) -> TrackingKind {
        TrackingKind::Kitsu
    }

    fn get_project_id(&self, name: &str) -> DailiesResult<Option<RecordId>> {
        self.find(&format!("data/projects?name={name}"))
    }

    fn get_entity_id(
        &self,
        name: &str,
        entity_type: EntityType,
    ) -> DailiesResult<Option<RecordId>> {
        self.find(&format!("data/{}s?name={name}", entity_type.lower()))
    }

    fn get_task_id(&self, entity_id: &RecordId, name: &str) -> DailiesResult<Option<RecordId>> {
        self.find(&format!(
            "data/tasks?entity_id={}&name={name}",
            entity_id.as_str()
        ))
    }

    fn get_artist_id(&self, name: &str) -> DailiesResult<Option<RecordId>> {
        self.find(&format!("data/persons?full_name={name}"))
    }

    fn insert_version(&self, ctx: &VersionContext) -> DailiesResult<()> {
        // Kitsu attaches review media to a task, so the task id is the one
        // identity this backend cannot do without.
        let task_id = ctx.require("task")?;

        let client = self.config.http_client()?;
        let url = format!(
            "{}/data/tasks/{}/preview-files",
            self.config.api_url,
            task_id.as_str()
        );
        let body = serde_json::json!({
            "name": ctx.version_name,
            "path": ctx.artifact_path.to_string_lossy(),
            "comment": ctx.comment,
            "person_id": ctx.artist_id,
        });
        http_post(&client, &url, &self.config.api_token, &body)?;
        tracing::info!("version '{}' inserted into kitsu", ctx.version_name);
        Ok(())
    }
}
