use crate::{
    error::DailiesResult,
    tracking::{
        EntityType, RecordId, TrackingBackend, TrackingConfig, TrackingKind, VersionContext,
        first_record_id, http_post,
    },
};

/// ftrack backend over its expression-query API.
///
/// All lookups go through the `/query` endpoint with an ftrack query
/// expression; creation goes through `/create`.
pub struct FtrackTracking {
    config: TrackingConfig,
}

impl FtrackTracking {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    fn query(&self, expression: &str) -> DailiesResult<Option<RecordId>> {
        let client = self.config.http_client()?;
        let url = format!("{}/query", self.config.api_url);
        let body = serde_json::json!({"expression": expression});
        let response = http_post(&client, &url, &self.config.api_token, &body)?;
        Ok(first_record_id(&response))
    }
}

impl TrackingBackend for FtrackTracking {
    fn kind(&self) -> TrackingKind {
        TrackingKind::Ftrack
    }

    fn get_project_id(&self, name: &str) -> DailiesResult<Option<RecordId>> {
        self.query(&format!(
            "select id from Project where full_name is \"{name}\""
        ))
    }

    fn get_entity_id(
        &self,
        name: &str,
        entity_type: EntityType,
    ) -> DailiesResult<Option<RecordId>> {
        // ftrack object types are PascalCase (Shot, Sequence, AssetBuild).
        self.query(&format!(
            "select id from {} where name is \"{name}\"",
            entity_type.pascal()
        ))
    }

    fn get_task_id(&self, entity_id: &RecordId, name: &str) -> DailiesResult<Option<RecordId>> {
        self.query(&format!(
            "select id from Task where parent_id is \"{}\" and name is \"{name}\"",
            entity_id.as_str()
        ))
    }

    fn get_artist_id(&self, name: &str) -> DailiesResult<Option<RecordId>> {
        self.query(&format!("select id from User where username is \"{name}\""))
    }

    fn insert_version(&self, ctx: &VersionContext) -> DailiesResult<()> {
        let project_id = ctx.require("project")?;

        let client = self.config.http_client()?;
        let url = format!("{}/create", self.config.api_url);
        let body = serde_json::json!({
            "entity_type": "AssetVersion",
            "entity_data": {
                "name": ctx.version_name,
                "comment": ctx.comment,
                "project_id": project_id,
                "asset_id": ctx.entity_id,
                "task_id": ctx.task_id,
                "user_id": ctx.artist_id,
                "custom_attributes": {
                    "artifact_path": ctx.artifact_path.to_string_lossy(),
                },
            }
        });
        http_post(&client, &url, &self.config.api_token, &body)?;
        tracing::info!("version '{}' inserted into ftrack", ctx.version_name);
        Ok(())
    }
}
