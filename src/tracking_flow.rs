use crate::{
    error::DailiesResult,
    tracking::{
        EntityType, RecordId, TrackingBackend, TrackingConfig, TrackingKind, VersionContext,
        first_record_id, http_get, http_post,
    },
};

/// Flow backend speaking its JSON:API-style surface.
pub struct FlowTracking {
    config: TrackingConfig,
}

impl FlowTracking {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    fn find(&self, resource: &str, field: &str, value: &str) -> DailiesResult<Option<RecordId>> {
        let client = self.config.http_client()?;
        let url = format!(
            "{}/{resource}?filter[{field}]={value}",
            self.config.api_url
        );
        let body = http_get(&client, &url, &self.config.api_token)?;
        Ok(first_record_id(&body))
    }
}

impl TrackingBackend for FlowTracking {
    fn kind(&self) -> TrackingKind {
        TrackingKind::Flow
    }

    fn get_project_id(&self, name: &str) -> DailiesResult<Option<RecordId>> {
        self.find("projects", "name", name)
    }

    fn get_entity_id(
        &self,
        name: &str,
        entity_type: EntityType,
    ) -> DailiesResult<Option<RecordId>> {
        let client = self.config.http_client()?;
        let url = format!(
            "{}/entities?filter[name]={name}&filter[entity-type]={}",
            self.config.api_url,
            entity_type.lower()
        );
        let body = http_get(&client, &url, &self.config.api_token)?;
        Ok(first_record_id(&body))
    }

    fn get_task_id(&self, entity_id: &RecordId, name: &str) -> DailiesResult<Option<RecordId>> {
        let client = self.config.http_client()?;
        let url = format!(
            "{}/tasks?filter[entity-id]={}&filter[name]={name}",
            self.config.api_url,
            entity_id.as_str()
        );
        let body = http_get(&client, &url, &self.config.api_token)?;
        Ok(first_record_id(&body))
    }

    fn get_artist_id(&self, name: &str) -> DailiesResult<Option<RecordId>> {
        self.find("users", "name", name)
    }

    fn insert_version(&self, ctx: &VersionContext) -> DailiesResult<()> {
        let project_id = ctx.require("project")?;

        let client = self.config.http_client()?;
        let url = format!("{}/versions", self.config.api_url);
        let body = serde_json::json!({
            "data": {
                "type": "versions",
                "attributes": {
                    "name": ctx.version_name,
                    "project-id": project_id,
                    "entity-id": ctx.entity_id,
                    "task-id": ctx.task_id,
                    "artist-id": ctx.artist_id,
                    "video-path": ctx.artifact_path.to_string_lossy(),
                    "comment": ctx.comment,
                },
            }
        });
        http_post(&client, &url, &self.config.api_token, &body)?;
        tracing::info!("version '{}' inserted into flow", ctx.version_name);
        Ok(())
    }
}
