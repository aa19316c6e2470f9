//! Snapshot tree layout shared by the exporter, the planner and the reader.
//!
//! ```text
//! <staging-root>/<entityType>/<default_language|translations>/<bundle-or-entityType>.json
//! <staging-root>/files/<relative-asset-path>
//! ```

use std::path::{Component, Path, PathBuf};

use crate::step::LanguageVariant;

/// Directory under the staging root holding copied binary assets.
pub const FILES_DIR: &str = "files";

/// Snapshot file location relative to the staging root.
pub fn snapshot_relative_path(entity_type: &str, variant: LanguageVariant, bundle: &str) -> PathBuf {
    Path::new(entity_type)
        .join(variant.as_str())
        .join(format!("{}.json", bundle))
}

pub fn snapshot_path(
    root: &Path,
    entity_type: &str,
    variant: LanguageVariant,
    bundle: &str,
) -> PathBuf {
    root.join(snapshot_relative_path(entity_type, variant, bundle))
}

/// Drop a stream-wrapper scheme (`public://`, `private://`, ...) from a URI.
pub fn strip_scheme(uri: &str) -> &str {
    match uri.find("://") {
        Some(pos) => &uri[pos + 3..],
        None => uri,
    }
}

/// Materialized location of an asset inside `files_dir`.
///
/// Leading slashes are dropped. `None` when the path would leave
/// `files_dir` (a `..` component) or names nothing.
pub fn asset_path(files_dir: &Path, uri: &str) -> Option<PathBuf> {
    let relative = Path::new(strip_scheme(uri).trim_start_matches('/'));
    let mut path = files_dir.to_path_buf();
    let mut pushed = false;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    pushed.then_some(path)
}
