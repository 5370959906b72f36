use std::collections::HashSet;

use reqwest::Url;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::location::Location;
use super::record::{Catalog, MediaConvention, SoundRecord};

/// Why a catalog could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("could not fetch catalog: {0}")]
    Transport(String),
    #[error("catalog is malformed: {0}")]
    Malformed(String),
    #[error("catalog contains no usable records")]
    Empty,
}

/// Fetches and normalizes the sound catalog.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    client: reqwest::Client,
    media: MediaConvention,
}

impl CatalogLoader {
    pub fn new(client: reqwest::Client, media: MediaConvention) -> Self {
        Self { client, media }
    }

    pub async fn load(&self, source: &Location) -> Result<Catalog, LoadError> {
        let body = match source {
            Location::Remote(url) => self.fetch_remote(url).await?,
            Location::Local(path) => tokio::fs::read(path)
                .await
                .map_err(|e| LoadError::Transport(format!("{}: {e}", path.display())))?,
        };

        let value: Value =
            serde_json::from_slice(&body).map_err(|e| LoadError::Malformed(e.to_string()))?;
        let catalog = normalize(value, &self.media)?;
        info!(%source, records = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// GET the catalog past any intermediate cache: no-store headers plus a
    /// throwaway query parameter, since some static hosts ignore the headers.
    async fn fetch_remote(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("_", &Uuid::new_v4().simple().to_string());

        self.client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| LoadError::Transport(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))
            .map(|b| b.to_vec())
    }
}

/// Turn a parsed catalog document into a `Catalog`.
///
/// The top level must be an array. Non-object elements, elements without an
/// id and repeated ids are dropped; the load only fails if nothing survives.
pub fn normalize(value: Value, media: &MediaConvention) -> Result<Catalog, LoadError> {
    let Value::Array(items) = value else {
        return Err(LoadError::Malformed(format!(
            "expected a JSON array at the top level, found {}",
            json_kind(&value)
        )));
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(fields) = item else {
            debug!(index, "skipping non-object catalog entry");
            continue;
        };
        let Some(record) = record_from_fields(&fields, media) else {
            debug!(index, "skipping catalog entry without an id");
            continue;
        };
        if !seen.insert(record.id.clone()) {
            warn!(id = %record.id, "duplicate id in catalog, keeping the first entry");
            continue;
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(Catalog::new(records))
}

fn record_from_fields(fields: &Map<String, Value>, media: &MediaConvention) -> Option<SoundRecord> {
    let id = text_field(fields, "id");
    if id.is_empty() {
        return None;
    }

    let audio = path_field(fields, "audio").or_else(|| media.audio_for(&id));
    let icon = path_field(fields, "icon").or_else(|| media.icon_for(&id));

    Some(SoundRecord {
        description: text_field(fields, "description"),
        audio,
        icon,
        kind: text_field(fields, "type"),
        ipa: text_field(fields, "ipa"),
        example: text_field(fields, "example"),
        id,
    })
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn path_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    Some(text_field(fields, key)).filter(|s| !s.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader() -> CatalogLoader {
        CatalogLoader::new(reqwest::Client::new(), MediaConvention::default())
    }

    fn remote(server: &MockServer, file: &str) -> Location {
        Location::parse(&server.uri())
            .join(file)
            .expect("valid url")
    }

    #[test]
    fn normalize_derives_missing_media_paths() {
        let catalog = normalize(
            json!([
                {"id": "CC01", "audio": "audio/CC01.mp3"},
                {"id": "CC02"}
            ]),
            &MediaConvention::default(),
        )
        .expect("normalize");

        let records = catalog.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].audio.as_deref(), Some("audio/CC01.mp3"));
        assert_eq!(records[1].audio.as_deref(), Some("audio/CC02.mp3"));
        assert_eq!(records[1].icon.as_deref(), Some("img/CC02.png"));
    }

    #[test]
    fn normalize_trims_and_fills_optional_fields() {
        let catalog = normalize(
            json!([{
                "id": "  CC05 ",
                "type": " vowel ",
                "ipa": "/e/",
                "audio": "   ",
                "icon": "icons/e.svg"
            }]),
            &MediaConvention::default(),
        )
        .expect("normalize");

        let record = &catalog.records()[0];
        assert_eq!(record.id, "CC05");
        assert_eq!(record.kind, "vowel");
        assert_eq!(record.description, "");
        assert_eq!(record.example, "");
        assert_eq!(record.audio.as_deref(), Some("audio/CC05.mp3"));
        assert_eq!(record.icon.as_deref(), Some("icons/e.svg"));
    }

    #[test]
    fn normalize_accepts_numeric_ids() {
        let catalog =
            normalize(json!([{"id": 7}]), &MediaConvention::default()).expect("normalize");
        assert_eq!(catalog.records()[0].id, "7");
    }

    #[test]
    fn normalize_drops_unusable_entries_and_duplicates() {
        let catalog = normalize(
            json!([
                {"id": "A", "example": "first"},
                {"id": ""},
                {"description": "no id"},
                "not an object",
                42,
                {"id": "A", "example": "second"},
                {"id": "B"}
            ]),
            &MediaConvention::default(),
        )
        .expect("normalize");

        let ids: Vec<_> = catalog.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(catalog.records()[0].example, "first");
    }

    #[test]
    fn normalize_without_derivation_leaves_audio_unset() {
        let media = MediaConvention {
            derive: false,
            ..MediaConvention::default()
        };
        let catalog = normalize(json!([{"id": "CC02"}]), &media).expect("normalize");
        assert_eq!(catalog.records()[0].audio, None);
        assert!(!catalog.records()[0].has_audio());
    }

    #[test]
    fn normalize_keeps_explicit_audio_for_unusual_ids() {
        let catalog = normalize(
            json!([
                {"id": "x#1"},
                {"id": "../up", "audio": "audio/up.mp3"}
            ]),
            &MediaConvention::default(),
        )
        .expect("normalize");
        assert_eq!(catalog.records()[0].audio, None);
        assert_eq!(catalog.records()[0].icon, None);
        assert_eq!(catalog.records()[1].audio.as_deref(), Some("audio/up.mp3"));
    }

    #[test]
    fn normalize_rejects_non_array_top_level() {
        let err = normalize(json!({"id": "CC01"}), &MediaConvention::default())
            .expect_err("object must be rejected");
        assert!(matches!(err, LoadError::Malformed(ref m) if m.contains("an object")));

        let err = normalize(json!("CC01"), &MediaConvention::default()).expect_err("scalar");
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn normalize_empty_after_filtering() {
        let err = normalize(json!([{"id": " "}, {}]), &MediaConvention::default())
            .expect_err("nothing usable");
        assert_eq!(err, LoadError::Empty);

        let err = normalize(json!([]), &MediaConvention::default()).expect_err("empty");
        assert_eq!(err, LoadError::Empty);
    }

    #[tokio::test]
    async fn load_remote_bypasses_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/colorchart.json"))
            .and(header("cache-control", "no-store"))
            .and(header("pragma", "no-cache"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "CC01", "ipa": "/a/", "example": "casa"},
                {"id": "CC02"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let catalog = loader()
            .load(&remote(&server, "data/colorchart.json"))
            .await
            .expect("load should succeed");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].label, "CC01 — /a/ — casa");
    }

    #[tokio::test]
    async fn load_remote_adds_cache_buster_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chart.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "X"}])))
            .mount(&server)
            .await;

        loader()
            .load(&remote(&server, "chart.json"))
            .await
            .expect("load should succeed");

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.query_pairs().any(|(k, v)| k == "_" && !v.is_empty()));
    }

    #[tokio::test]
    async fn load_remote_error_status_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = loader()
            .load(&remote(&server, "missing.json"))
            .await
            .expect_err("404 must fail");
        assert!(matches!(err, LoadError::Transport(_)));
    }

    #[tokio::test]
    async fn load_remote_invalid_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chart.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = loader()
            .load(&remote(&server, "chart.json"))
            .await
            .expect_err("html must fail");
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[tokio::test]
    async fn load_local_file() {
        let dir = std::env::temp_dir().join("soundchart_test_loader");
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let file = dir.join("chart.json");
        std::fs::write(&file, r#"[{"id": "CC01", "description": "open vowel"}]"#)
            .expect("write catalog");

        let catalog = loader()
            .load(&Location::Local(file))
            .await
            .expect("load should succeed");
        assert_eq!(catalog.records()[0].description, "open vowel");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn load_local_missing_file_is_transport() {
        let err = loader()
            .load(&Location::parse("/nonexistent/soundchart/chart.json"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, LoadError::Transport(_)));
    }
}
