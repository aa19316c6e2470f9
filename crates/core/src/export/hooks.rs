//! Built-in pre-export hooks.

use serde_json::Value;
use staging_schema::EntityKind;

use super::{ExportContext, ExportHook, Snapshot};
use crate::error::ExportError;
use crate::layout::{asset_path, FILES_DIR};
use crate::normalize::classify;
use crate::step::ASSET_URI_FIELD;

/// Account ids owned by the host system (anonymous, administrator).
pub const RESERVED_ACCOUNT_IDS: [&str; 2] = ["0", "1"];

/// Drops system-reserved accounts; the target has its own.
pub struct ReservedAccountFilter;

impl ExportHook for ReservedAccountFilter {
    fn name(&self) -> &'static str {
        "reserved_accounts"
    }

    fn before_export(
        &self,
        ctx: &ExportContext<'_>,
        snapshots: &mut Vec<Snapshot>,
    ) -> Result<(), ExportError> {
        if ctx.entity_type.kind == EntityKind::Account {
            let before = snapshots.len();
            snapshots.retain(|s| !RESERVED_ACCOUNT_IDS.contains(&s.entity_id.as_str()));
            tracing::debug!(dropped = before - snapshots.len(), "reserved accounts removed");
        }
        Ok(())
    }
}

/// Replaces hierarchical self-references with the parents the repository
/// reports, which the field storage alone does not carry.
pub struct HierarchyParentAttacher;

impl ExportHook for HierarchyParentAttacher {
    fn name(&self) -> &'static str {
        "hierarchy_parents"
    }

    fn before_export(
        &self,
        ctx: &ExportContext<'_>,
        snapshots: &mut Vec<Snapshot>,
    ) -> Result<(), ExportError> {
        let et = ctx.entity_type;
        let bundle = ctx.bundle.unwrap_or(&et.id);
        let hierarchy: Vec<&str> = et
            .fields_for(bundle)
            .iter()
            .filter(|f| f.is_hierarchy() && f.target_type() == Some(et.id.as_str()))
            .map(|f| f.name.as_str())
            .collect();
        if hierarchy.is_empty() {
            return Ok(());
        }

        for snapshot in snapshots.iter_mut() {
            let parents = ctx.repository.parents(&et.id, &snapshot.entity_id);
            if parents.is_empty() {
                continue;
            }
            for field in &hierarchy {
                snapshot
                    .fields
                    .insert((*field).to_string(), Value::Array(parents.clone()));
            }
        }
        Ok(())
    }
}

/// Copies the binary behind each asset into `<staging-root>/files/`.
pub struct AssetCopier;

impl ExportHook for AssetCopier {
    fn name(&self) -> &'static str {
        "asset_copy"
    }

    fn before_export(
        &self,
        ctx: &ExportContext<'_>,
        snapshots: &mut Vec<Snapshot>,
    ) -> Result<(), ExportError> {
        if ctx.entity_type.kind != EntityKind::Asset {
            return Ok(());
        }
        let files_dir = ctx.staging_root.join(FILES_DIR);

        for snapshot in snapshots.iter() {
            let Some(raw) = snapshot.fields.get(ASSET_URI_FIELD) else {
                continue;
            };
            let value = classify(ASSET_URI_FIELD, raw).into_value();
            let Some(uri) = value.as_str() else {
                continue;
            };
            let Some(from) = ctx.repository.asset_location(uri) else {
                tracing::warn!(uri, entity = %snapshot.entity_id, "asset binary not found, not copied");
                continue;
            };

            let Some(to) = asset_path(&files_dir, uri) else {
                tracing::warn!(uri, entity = %snapshot.entity_id, "asset uri escapes the files directory, not copied");
                continue;
            };
            if let Some(dir) = to.parent() {
                std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
            std::fs::copy(&from, &to).map_err(|source| ExportError::AssetCopy {
                uri: uri.to_string(),
                from: from.clone(),
                source,
            })?;
            tracing::debug!(uri, to = %to.display(), "asset copied");
        }
        Ok(())
    }
}
