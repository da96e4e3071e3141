use crate::{
    error::DailiesResult,
    tracking::{
        EntityType, RecordId, TrackingBackend, TrackingConfig, TrackingKind, VersionContext,
        first_record_id, http_get, http_post,
    },
};

/// Shotgun (Autodesk Flow Production Tracking) backend over its REST API.
///
/// Projects match on `name`, shots/sequences/assets on `code` (Shotgun's
/// PascalCase entity naming), tasks on their linked entity, artists on
/// `HumanUser.name`.
pub struct ShotgunTracking {
    config: TrackingConfig,
}

impl ShotgunTracking {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    fn find_one(&self, entity: &str, field: &str, value: &str) -> DailiesResult<Option<RecordId>> {
        let client = self.config.http_client()?;
        let url = format!(
            "{}/entity/{entity}?fields=id&filter[{field}]={value}",
            self.config.api_url
        );
        let body = http_get(&client, &url, &self.config.api_token)?;
        Ok(first_record_id(&body))
    }
}

impl TrackingBackend for ShotgunTracking {
    fn kind(&self) -> TrackingKind {
        TrackingKind::Shotgun
    }

    fn get_project_id(&self, name: &str) -> DailiesResult<Option<RecordId>> {
        self.find_one("projects", "name", name)
    }

    fn get_entity_id(
        &self,
        name: &str,
        entity_type: EntityType,
    ) -> DailiesResult<Option<RecordId>> {
        // Shotgun's REST collections are lowercase plural of the PascalCase
        // entity type, matched on the `code` field.
        let collection = format!("{}s", entity_type.lower());
        self.find_one(&collection, "code", name)
    }

    fn get_task_id(&self, entity_id: &RecordId, name: &str) -> DailiesResult<Option<RecordId>> {
        let client = self.config.http_client()?;
        let url = format!(
            "{}/entity/tasks?fields=id&filter[entity]={}&filter[content]={name}",
            self.config.api_url,
            entity_id.as_str()
        );
        let body = http_get(&client, &url, &self.config.api_token)?;
        Ok(first_record_id(&body))
    }

    fn get_artist_id(&self, name: &str) -> DailiesResult<Option<RecordId>> {
        self.find_one("human_users", "name", name)
    }

    fn insert_version(&self, ctx: &VersionContext) -> DailiesResult<()> {
        let body = version_body(ctx)?;

        let client = self.config.http_client()?;
        let url = format!("{}/entity/versions", self.config.api_url);
        http_post(&client, &url, &self.config.api_token, &body)?;
        tracing::info!("version '{}' inserted into shotgun", ctx.version_name);
        Ok(())
    }
}

fn version_body(ctx: &VersionContext) -> DailiesResult<serde_json::Value> {
    let project_id = ctx.require("project")?;

    let mut attributes = serde_json::json!({
        "code": ctx.version_name,
        "sg_path_to_movie": ctx.artifact_path.to_string_lossy(),
        "description": ctx.comment,
    });
    if let Some(entity_id) = &ctx.entity_id {
        // The entity link is typed with the session's entity kind, so
        // sequence and asset versions link as their own type.
        attributes["entity"] =
            serde_json::json!({"type": ctx.entity_type.pascal(), "id": entity_id});
    }
    if let Some(task_id) = &ctx.task_id {
        attributes["sg_task"] = serde_json::json!({"type": "Task", "id": task_id});
    }
    if let Some(artist_id) = &ctx.artist_id {
        attributes["user"] = serde_json::json!({"type": "HumanUser", "id": artist_id});
    }

    Ok(serde_json::json!({
        "data": {
            "type": "versions",
            "attributes": attributes,
            "relationships": {
                "project": {"data": {"type": "Project", "id": project_id}},
            },
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx(entity_type: EntityType) -> VersionContext {
        VersionContext {
            version_name: "sq01_v003".into(),
            artifact_path: PathBuf::from("/out/sq01_v003.mov"),
            comment: "first pass".into(),
            entity_type,
            project_id: Some(RecordId::from("7")),
            entity_id: Some(RecordId::from("88")),
            task_id: None,
            artist_id: None,
        }
    }

    #[test]
    fn entity_link_is_typed_by_the_session_entity_kind() {
        let body = version_body(&ctx(EntityType::Sequence)).unwrap();
        let entity = &body["data"]["attributes"]["entity"];
        assert_eq!(entity["type"], "Sequence");
        assert_eq!(entity["id"], "88");

        let body = version_body(&ctx(EntityType::Asset)).unwrap();
        assert_eq!(body["data"]["attributes"]["entity"]["type"], "Asset");

        let body = version_body(&ctx(EntityType::Shot)).unwrap();
        assert_eq!(body["data"]["attributes"]["entity"]["type"], "Shot");
    }

    #[test]
    fn body_links_the_project_and_omits_absent_slots() {
        let body = version_body(&ctx(EntityType::Shot)).unwrap();
        assert_eq!(body["data"]["relationships"]["project"]["data"]["id"], "7");
        assert_eq!(body["data"]["attributes"]["code"], "sq01_v003");
        assert!(body["data"]["attributes"].get("sg_task").is_none());
        assert!(body["data"]["attributes"].get("user").is_none());
    }
}
