use chrono::TimeDelta;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// All known platforms and their status-page URLs, rebuilt in full on every
/// successful index fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformIndex {
    platforms: Vec<String>,
    urls: HashMap<String, String>,
    architectures: Vec<String>,
}

impl PlatformIndex {
    pub fn new(urls: HashMap<String, String>) -> Self {
        let mut platforms: Vec<String> = urls.keys().cloned().collect();
        platforms.sort();
        let architectures = derive_architectures(&platforms);
        Self {
            platforms,
            urls,
            architectures,
        }
    }

    /// Platform display names, sorted.
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// Architecture short-names with `_latest`/`_oldest` suffixes, sorted
    /// and deduplicated.
    pub fn architectures(&self) -> &[String] {
        &self.architectures
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn url_for(&self, platform: &str) -> Option<&str> {
        self.urls.get(platform).map(String::as_str)
    }

    /// Resolves an architecture token (`arm`, `arm_latest`, `mips_oldest`)
    /// to a platform name. A bare token defaults to `_oldest`, the legacy
    /// short-name behavior. Returns `None` when nothing matches; that is a
    /// lookup miss, not an error.
    pub fn resolve(&self, arch: &str) -> Option<&str> {
        let (token, release) = match arch.split_once('_') {
            Some((token, release)) => (token, release),
            None => (arch, "oldest"),
        };
        if release != "oldest" && release != "latest" {
            return None;
        }
        let needle = token.to_uppercase();
        let hits: Vec<&String> = self
            .platforms
            .iter()
            .filter(|p| p.contains(&needle))
            .collect();
        let hit = if release == "latest" {
            hits.last()
        } else {
            hits.first()
        };
        hit.map(|s| s.as_str())
    }

    /// Matches a user-supplied platform argument against the display names,
    /// treating `_` and space as interchangeable and ignoring case.
    pub fn find_platform(&self, arg: &str) -> Option<&str> {
        let want = arg.replace('_', " ");
        self.platforms
            .iter()
            .find(|p| p.eq_ignore_ascii_case(&want))
            .map(String::as_str)
    }
}

/// First whitespace token of each sorted platform name, lowercased.
/// Duplicated tokens are split into `<arch>_latest` and `<arch>_oldest`;
/// a token that appears once is always `_latest`.
fn derive_architectures(platforms: &[String]) -> Vec<String> {
    let tokens: Vec<String> = platforms
        .iter()
        .map(|p| {
            p.split_whitespace()
                .next()
                .unwrap_or_default()
                .to_lowercase()
        })
        .collect();
    let mut archs: Vec<String> = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let duplicated = tokens.iter().filter(|t| *t == token).count() > 1;
        let release = if duplicated && archs.contains(&format!("{token}_latest")) {
            "oldest"
        } else {
            "latest"
        };
        archs.push(format!("{token}_{release}"));
    }
    archs.sort();
    archs.dedup();
    archs
}

/// Row schema observed on the status pages. The legacy layout carries two
/// class-tagged cells (name, status), the current one four (ordinal, name,
/// vendor, status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    Legacy,
    Current,
}

impl RowLayout {
    pub fn detect(class_cells: usize) -> Option<Self> {
        match class_cells {
            0 | 1 => None,
            2 | 3 => Some(Self::Legacy),
            _ => Some(Self::Current),
        }
    }
}

/// One build machine ("box") as rendered on a platform's status page.
/// Timestamp and duration fields keep the server's own textual form; the
/// export field names follow the established JSON dump format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoxRecord {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "No")]
    pub ordinal: String,
    #[serde(rename = "BoxNameClass")]
    pub name_class: String,
    #[serde(rename = "OemName")]
    pub oem_name: String,
    #[serde(rename = "OemNameClass")]
    pub oem_name_class: String,
    #[serde(rename = "BuildStatus")]
    pub status: String,
    #[serde(rename = "BuildClass")]
    pub status_class: String,
    #[serde(rename = "StartBuild")]
    pub start_build: String,
    #[serde(rename = "StartFeedSync")]
    pub start_feed_sync: String,
    #[serde(rename = "EndBuild")]
    pub end_build: String,
    #[serde(rename = "SyncTime")]
    pub sync_time: String,
    #[serde(rename = "BuildTime")]
    pub build_time: String,
}

impl BoxRecord {
    /// The status label set is server-defined and open; anything we do not
    /// recognize is inert. Matching is by substring, as the labels carry
    /// decorations on some pages.
    pub fn is_building(&self) -> bool {
        self.status.contains("Building")
    }

    pub fn is_failed(&self) -> bool {
        self.status.contains("Failed")
    }
}

/// One platform-switch button on the page: label plus `location.href` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTarget {
    pub name: String,
    pub url: String,
}

/// Everything extracted from one status page. Immutable once produced; a new
/// fetch yields a wholly new snapshot. Box order is page order, which encodes
/// the build queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub title: String,
    pub headline: String,
    #[serde(rename = "versionurls", serialize_with = "ser_switch_targets")]
    pub switch_targets: Vec<SwitchTarget>,
    #[serde(rename = "boxinfo", serialize_with = "ser_boxes")]
    pub boxes: Vec<BoxRecord>,
}

impl StatusSnapshot {
    /// Inserts a record, keeping page order. A duplicate name overwrites the
    /// earlier record in place: the server does not guarantee uniqueness on
    /// degenerate pages and the last row wins.
    pub fn insert(&mut self, record: BoxRecord) {
        if let Some(slot) = self.boxes.iter_mut().find(|b| b.name == record.name) {
            *slot = record;
        } else {
            self.boxes.push(record);
        }
    }

    pub fn get(&self, name: &str) -> Option<&BoxRecord> {
        self.boxes.iter().find(|b| b.name == name)
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

fn ser_switch_targets<S: Serializer>(
    targets: &[SwitchTarget],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct UrlEntry<'a> {
        url: &'a str,
    }
    let mut map = serializer.serialize_map(Some(targets.len()))?;
    for target in targets {
        map.serialize_entry(&target.name, &UrlEntry { url: &target.url })?;
    }
    map.end()
}

fn ser_boxes<S: Serializer>(boxes: &[BoxRecord], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(boxes.len()))?;
    for record in boxes {
        map.serialize_entry(&record.name, record)?;
    }
    map.end()
}

/// Whether the evaluated snapshot contained the requested target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetResult {
    /// No target was requested.
    None,
    Found,
    /// Target absent; wait and ahead-count are zeroed but the platform-wide
    /// counts stay valid.
    Missing,
}

/// Outcome of one queue evaluation. Transient: recomputed from a snapshot on
/// every call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationResult {
    /// Estimated time until the target box starts building.
    pub next_build: TimeDelta,
    /// Boxes queued before the target, counted from the currently building
    /// box. May be -1 for an empty snapshot, mirroring the source contract.
    pub boxes_ahead: i64,
    /// Sum of every box's last build duration, excluding the one currently
    /// building.
    pub cycle_time: TimeDelta,
    pub box_count: usize,
    pub failed_count: usize,
    pub target: TargetResult,
}
