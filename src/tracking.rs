use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::error::{DailiesError, DailiesResult};

/// Opaque tracking-system record ID.
///
/// Services disagree on the underlying type (integers for Shotgun/ftrack,
/// UUID strings for Kitsu), so IDs travel as strings end to end.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Entity kind a version links against.
///
/// Casing conventions differ across services (Shotgun wants `Shot`, Kitsu
/// compares lowercased); each backend picks its own casing from the
/// accessors rather than this type normalizing one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntityType {
    #[default]
    Shot,
    Sequence,
    Asset,
}

impl EntityType {
    pub fn lower(self) -> &'static str {
        match self {
            EntityType::Shot => "shot",
            EntityType::Sequence => "sequence",
            EntityType::Asset => "asset",
        }
    }

    pub fn pascal(self) -> &'static str {
        match self {
            EntityType::Shot => "Shot",
            EntityType::Sequence => "Sequence",
            EntityType::Asset => "Asset",
        }
    }
}

impl FromStr for EntityType {
    type Err = DailiesError;

    fn from_str(s: &str) -> DailiesResult<Self> {
        match s.to_lowercase().as_str() {
            "shot" => Ok(EntityType::Shot),
            "sequence" => Ok(EntityType::Sequence),
            "asset" => Ok(EntityType::Asset),
            other => Err(DailiesError::validation(format!(
                "unknown entity type '{other}' (expected shot, sequence or asset)"
            ))),
        }
    }
}

/// Everything `insert_version` consumes.
///
/// Identity IDs are optional here; each backend raises
/// [`DailiesError::MissingIdentity`] for the ones it strictly requires.
#[derive(Clone, Debug)]
pub struct VersionContext {
    pub version_name: String,
    pub artifact_path: PathBuf,
    pub comment: String,
    /// Kind of the linked entity; backends that type their entity links
    /// (e.g. Shotgun) render it in their own casing.
    pub entity_type: EntityType,
    pub project_id: Option<RecordId>,
    pub entity_id: Option<RecordId>,
    pub task_id: Option<RecordId>,
    pub artist_id: Option<RecordId>,
}

impl VersionContext {
    pub fn require(&self, slot: &'static str) -> DailiesResult<&RecordId> {
        let id = match slot {
            "project" => &self.project_id,
            "entity" => &self.entity_id,
            "task" => &self.task_id,
            "artist" => &self.artist_id,
            _ => &None,
        };
        id.as_ref().ok_or(DailiesError::MissingIdentity { slot })
    }
}

/// Narrow capability contract over a remote production-tracking service.
///
/// Stateless from the caller's perspective: invoked, never mutated. Lookup
/// misses return `Ok(None)`; transport and protocol failures return
/// `Err`, which the identity resolver degrades to an unresolved slot.
pub trait TrackingBackend {
    fn kind(&self) -> TrackingKind;

    fn get_project_id(&self, name: &str) -> DailiesResult<Option<RecordId>>;

    fn get_entity_id(&self, name: &str, entity_type: EntityType)
    -> DailiesResult<Option<RecordId>>;

    fn get_task_id(&self, entity_id: &RecordId, name: &str) -> DailiesResult<Option<RecordId>>;

    fn get_artist_id(&self, name: &str) -> DailiesResult<Option<RecordId>>;

    fn insert_version(&self, ctx: &VersionContext) -> DailiesResult<()>;
}

/// The supported tracking services, selected once by lowercase identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingKind {
    Shotgun,
    Ftrack,
    Kitsu,
    Flow,
}

impl TrackingKind {
    pub fn name(self) -> &'static str {
        match self {
            TrackingKind::Shotgun => "shotgun",
            TrackingKind::Ftrack => "ftrack",
            TrackingKind::Kitsu => "kitsu",
            TrackingKind::Flow => "flow",
        }
    }

    fn default_api_url(self) -> &'static str {
        match self {
            TrackingKind::Shotgun => "https://your-shotgun-instance.com/api/v1",
            TrackingKind::Ftrack => "https://your-ftrack-instance.com/api/v1",
            TrackingKind::Kitsu => "https://your-kitsu-instance.com/api/v1",
            TrackingKind::Flow => "https://your-flow-instance.com/api/v1",
        }
    }
}

impl std::fmt::Display for TrackingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrackingKind {
    type Err = DailiesError;

    fn from_str(s: &str) -> DailiesResult<Self> {
        match s.to_lowercase().as_str() {
            "shotgun" => Ok(TrackingKind::Shotgun),
            "ftrack" => Ok(TrackingKind::Ftrack),
            "kitsu" => Ok(TrackingKind::Kitsu),
            "flow" => Ok(TrackingKind::Flow),
            other => Err(DailiesError::validation(format!(
                "unknown tracking service '{other}' (expected shotgun, ftrack, kitsu or flow)"
            ))),
        }
    }
}

/// Connection settings shared by the REST backends.
#[derive(Clone, Debug)]
pub struct TrackingConfig {
    pub api_url: String,
    pub api_token: String,
    pub login: String,
}

impl TrackingConfig {
    /// Loads settings from `TRACKING_API_URL`, `TRACKING_API_TOKEN` and
    /// `TRACKING_LOGIN_USR`, falling back to the service's placeholder URL.
    pub fn from_env(kind: TrackingKind) -> Self {
        let api_url = std::env::var("TRACKING_API_URL")
            .unwrap_or_else(|_| kind.default_api_url().to_string());
        let api_token = std::env::var("TRACKING_API_TOKEN").unwrap_or_default();
        let login = std::env::var("TRACKING_LOGIN_USR").unwrap_or_default();
        if api_token.is_empty() {
            tracing::warn!("TRACKING_API_TOKEN is not set; tracking calls will be unauthorized");
        }
        Self { api_url, api_token, login }
    }

    pub(crate) fn http_client(&self) -> DailiesResult<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DailiesError::tracking(format!("failed to build http client: {e}")))
    }
}

pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// GETs `url` and parses the JSON body; non-2xx statuses are tracking errors
/// with the response text attached.
pub(crate) fn http_get(
    client: &reqwest::blocking::Client,
    url: &str,
    token: &str,
) -> DailiesResult<serde_json::Value> {
    let response = client
        .get(url)
        .header("Authorization", bearer(token))
        .header("Content-Type", "application/json")
        .send()
        .map_err(|e| DailiesError::tracking(format!("GET {url} failed: {e}")))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| DailiesError::tracking(format!("GET {url}: unreadable body: {e}")))?;
    if !status.is_success() {
        return Err(DailiesError::tracking(format!("GET {url}: {status}: {body}")));
    }
    serde_json::from_str(&body)
        .map_err(|e| DailiesError::tracking(format!("GET {url}: invalid JSON: {e}")))
}

/// POSTs a JSON body to `url`; same error conventions as [`http_get`].
pub(crate) fn http_post(
    client: &reqwest::blocking::Client,
    url: &str,
    token: &str,
    body: &serde_json::Value,
) -> DailiesResult<serde_json::Value> {
    let response = client
        .post(url)
        .header("Authorization", bearer(token))
        .json(body)
        .send()
        .map_err(|e| DailiesError::tracking(format!("POST {url} failed: {e}")))?;
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| DailiesError::tracking(format!("POST {url}: unreadable body: {e}")))?;
    if !status.is_success() {
        return Err(DailiesError::tracking(format!("POST {url}: {status}: {text}")));
    }
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&text)
        .map_err(|e| DailiesError::tracking(format!("POST {url}: invalid JSON: {e}")))
}

/// Extracts the `id` of the first record in a `{"data": [...]}` response.
/// Numeric and string IDs both normalize to [`RecordId`].
pub(crate) fn first_record_id(value: &serde_json::Value) -> Option<RecordId> {
    let record = match &value["data"] {
        serde_json::Value::Array(items) => items.first()?,
        record @ serde_json::Value::Object(_) => record,
        _ => return None,
    };
    record_id(record)
}

pub(crate) fn record_id(record: &serde_json::Value) -> Option<RecordId> {
    match &record["id"] {
        serde_json::Value::Number(n) => Some(RecordId(n.to_string())),
        serde_json::Value::String(s) => Some(RecordId(s.clone())),
        _ => None,
    }
}

/// Constructs the tracking backend for `kind`.
pub fn create_tracking(kind: TrackingKind, config: TrackingConfig) -> Box<dyn TrackingBackend> {
    match kind {
        TrackingKind::Shotgun => Box::new(crate::tracking_shotgun::ShotgunTracking::new(config)),
        TrackingKind::Ftrack => Box::new(crate::tracking_ftrack::FtrackTracking::new(config)),
        TrackingKind::Kitsu => Box::new(crate::tracking_kitsu::KitsuTracking::new(config)),
        TrackingKind::Flow => Box::new(crate::tracking_flow::FlowTracking::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_lowercase_identifiers() {
        assert_eq!("shotgun".parse::<TrackingKind>().unwrap(), TrackingKind::Shotgun);
        assert_eq!("KITSU".parse::<TrackingKind>().unwrap(), TrackingKind::Kitsu);
        assert!("asana".parse::<TrackingKind>().is_err());
    }

    #[test]
    fn entity_type_accessors_expose_both_casings() {
        assert_eq!(EntityType::Shot.lower(), "shot");
        assert_eq!(EntityType::Shot.pascal(), "Shot");
        assert_eq!("ASSET".parse::<EntityType>().unwrap(), EntityType::Asset);
    }

    #[test]
    fn first_record_id_handles_numeric_string_and_missing_ids() {
        let numeric: serde_json::Value = serde_json::json!({"data": [{"id": 42, "name": "mr"}]});
        assert_eq!(first_record_id(&numeric), Some(RecordId::from("42")));

        let uuid: serde_json::Value =
            serde_json::json!({"data": {"id": "b5d1-77", "name": "mr"}});
        assert_eq!(first_record_id(&uuid), Some(RecordId::from("b5d1-77")));

        let empty: serde_json::Value = serde_json::json!({"data": []});
        assert_eq!(first_record_id(&empty), None);
    }

    #[test]
    fn version_context_requires_named_slots() {
        let ctx = VersionContext {
            version_name: "v001".into(),
            artifact_path: PathBuf::from("/out/daily.mov"),
            comment: String::new(),
            entity_type: EntityType::Shot,
            project_id: Some(RecordId::from("42")),
            entity_id: None,
            task_id: None,
            artist_id: None,
        };
        assert_eq!(ctx.require("project").unwrap().as_str(), "42");
        let err = ctx.require("task").unwrap_err();
        assert!(matches!(err, DailiesError::MissingIdentity { slot: "task" }));
    }
}
