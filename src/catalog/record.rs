use std::fmt;

/// One entry of the sound catalog, after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundRecord {
    pub id: String,
    pub description: String,
    /// Explicit or derived audio path; `None` when neither is available.
    pub audio: Option<String>,
    pub icon: Option<String>,
    /// The `type` field of the source document.
    pub kind: String,
    pub ipa: String,
    pub example: String,
}

impl SoundRecord {
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Listing label: the non-empty parts of id, IPA and example.
    pub fn label(&self) -> String {
        [self.id.as_str(), self.ipa.as_str(), self.example.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" — ")
    }

    pub fn list_entry(&self) -> ListEntry {
        ListEntry {
            id: self.id.clone(),
            label: self.label(),
        }
    }
}

/// An `{id, label}` pair handed to the listing widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: String,
    pub label: String,
}

impl ListEntry {
    /// Entry shown in place of the listing when no catalog could be loaded.
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            label: label.into(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// The loaded catalog, in source order. Replaced wholesale on every load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<SoundRecord>,
}

impl Catalog {
    pub fn new(records: Vec<SoundRecord>) -> Self {
        Self { records }
    }

    #[cfg(test)]
    pub fn records(&self) -> &[SoundRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundRecord> {
        self.records.iter()
    }

    pub fn first(&self) -> Option<&SoundRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn entries(&self) -> Vec<ListEntry> {
        self.records.iter().map(SoundRecord::list_entry).collect()
    }
}

/// Naming convention used to derive media paths from a record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConvention {
    pub derive: bool,
    pub audio_dir: String,
    pub audio_ext: String,
    pub icon_dir: String,
    pub icon_ext: String,
}

impl Default for MediaConvention {
    fn default() -> Self {
        Self {
            derive: true,
            audio_dir: "audio".to_owned(),
            audio_ext: "mp3".to_owned(),
            icon_dir: "img".to_owned(),
            icon_ext: "png".to_owned(),
        }
    }
}

impl MediaConvention {
    pub fn audio_for(&self, id: &str) -> Option<String> {
        self.derive
            .then(|| derived_path(&self.audio_dir, id, &self.audio_ext))
            .flatten()
    }

    pub fn icon_for(&self, id: &str) -> Option<String> {
        self.derive
            .then(|| derived_path(&self.icon_dir, id, &self.icon_ext))
            .flatten()
    }
}

/// Only ids that form a single plain path segment derive a path.
fn derived_path(dir: &str, id: &str, ext: &str) -> Option<String> {
    if id.contains(['/', '\\', '#', '?']) || id.contains("..") {
        return None;
    }
    let dir = dir.trim_end_matches('/');
    Some(if dir.is_empty() {
        format!("{id}.{ext}")
    } else {
        format!("{dir}/{id}.{ext}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, ipa: &str, example: &str) -> SoundRecord {
        SoundRecord {
            id: id.to_owned(),
            description: String::new(),
            audio: None,
            icon: None,
            kind: String::new(),
            ipa: ipa.to_owned(),
            example: example.to_owned(),
        }
    }

    #[test]
    fn label_joins_non_empty_parts() {
        assert_eq!(record("CC01", "/a/", "casa").label(), "CC01 — /a/ — casa");
        assert_eq!(record("CC02", "", "perro").label(), "CC02 — perro");
        assert_eq!(record("CC03", "", "").label(), "CC03");
    }

    #[test]
    fn default_convention_paths() {
        let media = MediaConvention::default();
        assert_eq!(media.audio_for("CC01").as_deref(), Some("audio/CC01.mp3"));
        assert_eq!(media.icon_for("CC01").as_deref(), Some("img/CC01.png"));
    }

    #[test]
    fn disabled_convention_derives_nothing() {
        let media = MediaConvention {
            derive: false,
            ..MediaConvention::default()
        };
        assert_eq!(media.audio_for("CC01"), None);
        assert_eq!(media.icon_for("CC01"), None);
    }

    #[test]
    fn empty_directory_yields_bare_file_name() {
        let media = MediaConvention {
            audio_dir: String::new(),
            audio_ext: "ogg".to_owned(),
            ..MediaConvention::default()
        };
        assert_eq!(media.audio_for("x").as_deref(), Some("x.ogg"));
    }

    #[test]
    fn ids_that_are_not_a_plain_segment_derive_nothing() {
        let media = MediaConvention::default();
        for id in ["a/b", "..", "../secret", "x#1", "x?y", "a\\b"] {
            assert_eq!(media.audio_for(id), None, "{id}");
            assert_eq!(media.icon_for(id), None, "{id}");
        }
        assert_eq!(media.audio_for("CC.01").as_deref(), Some("audio/CC.01.mp3"));
    }

    #[test]
    fn placeholder_entry_has_no_id() {
        let entry = ListEntry::placeholder("Catalog unavailable");
        assert!(entry.is_placeholder());
        assert_eq!(entry.to_string(), "Catalog unavailable");
    }
}
