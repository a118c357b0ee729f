//! Maven repository path parsing.
//!
//! A request path looks like `/<group segments...>/<plugin>/<version>/<file>`.
//! The group segments joined with `.` become the group id written into
//! generated descriptors.

/// The artifact kinds the repository serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Archive,
    Descriptor,
    DescriptorSha1,
    DescriptorMd5,
    ArchiveSha1,
    ArchiveMd5,
}

/// Filename suffixes mapped to artifact kinds, tried in order; first match wins.
pub const ARTIFACT_ROUTES: &[(&str, ArtifactKind)] = &[
    (".jar", ArtifactKind::Archive),
    (".pom", ArtifactKind::Descriptor),
    (".pom.sha1", ArtifactKind::DescriptorSha1),
    (".pom.md5", ArtifactKind::DescriptorMd5),
    (".jar.sha1", ArtifactKind::ArchiveSha1),
    (".jar.md5", ArtifactKind::ArchiveMd5),
];

impl ArtifactKind {
    /// Kind of artifact named by `filename`, if the repository serves it.
    pub fn from_filename(filename: &str) -> Option<Self> {
        ARTIFACT_ROUTES
            .iter()
            .find(|(suffix, _)| filename.ends_with(suffix))
            .map(|(_, kind)| *kind)
    }
}

/// A parsed artifact request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub group_id: String,
    pub plugin: String,
    pub version: String,
    pub filename: String,
    pub kind: ArtifactKind,
}

impl ArtifactRequest {
    /// Parse a request path; `None` if it is not a servable artifact path.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(decode_segment)
            .collect();

        let [group @ .., plugin, version, filename] = segments.as_slice() else {
            return None;
        };
        if plugin.is_empty() || version.is_empty() || filename.is_empty() {
            return None;
        }
        let kind = ArtifactKind::from_filename(filename)?;

        Some(Self {
            group_id: group.join("."),
            plugin: plugin.clone(),
            version: version.clone(),
            filename: filename.clone(),
            kind,
        })
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
