//! CLI presentation: text and json formatters per command family.

use crate::cache::CacheStats;
use crate::normalize::{item_winners, FeatureKind, NormalizedManifest};
use crate::pipeline::ApplySummary;
use crate::selection::{FeatureSelection, SelectionState};
use crate::settings::Settings;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use indexmap::IndexMap;
use owo_colors::OwoColorize;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Format a section heading with bold/underline. Respects NO_COLOR and TTY.
fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_apply_summary(summary: &ApplySummary) -> String {
    let heading = if summary.dry_run {
        "Apply (dry run)"
    } else {
        "Apply"
    };
    let mut out = format!("{}\n\n", format_section_heading(heading));

    out.push_str(&format!("  Manifests: {}\n", summary.manifests));
    let items_str = if summary.enabled_items.is_empty() {
        "(none)".to_string()
    } else {
        summary.enabled_items.join(", ")
    };
    out.push_str(&format!("  Enabled items: {}\n", items_str));
    out.push_str(&format!("  Fragments merged: {}\n", summary.fragments.len()));
    let flag_count = summary
        .document
        .as_object()
        .map(|m| m.len())
        .unwrap_or(0);
    out.push_str(&format!("  Flags in document: {}\n", flag_count));

    if summary.dry_run && !summary.fragments.is_empty() {
        out.push_str("\nResolved fragments:\n");
        for path in &summary.fragments {
            out.push_str(&format!("  {}\n", path.display()));
        }
    }

    if summary.targets.is_empty() {
        out.push_str("\nNo install directories found.\n");
    } else if summary.dry_run {
        out.push_str(&format!(
            "\nWould write to {} install(s):\n",
            summary.targets.len()
        ));
        for target in &summary.targets {
            out.push_str(&format!("  {}\n", target.display()));
        }
    } else {
        out.push_str(&format!("\nWritten to {} install(s):\n", summary.written.len()));
        for path in &summary.written {
            out.push_str(&format!("  {}\n", path.display()));
        }
    }
    out
}

pub fn format_fragments_text(fragments: &[PathBuf]) -> String {
    if fragments.is_empty() {
        return "No fragments selected.\n".to_string();
    }
    let mut out = String::from("Selected fragments:\n");
    for path in fragments {
        out.push_str(&format!("  {}\n", path.display()));
    }
    out.push_str(&format!("\nTotal: {} fragment(s)\n", fragments.len()));
    out
}

pub fn format_fragments_json(fragments: &[PathBuf]) -> String {
    let paths: Vec<String> = fragments
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let out = json!({ "fragments": paths, "total": fragments.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_dump_text(dumped: &IndexMap<String, Value>) -> String {
    if dumped.is_empty() {
        return "No fragments selected.\n".to_string();
    }
    let mut out = String::new();
    for (path, value) in dumped {
        out.push_str(&format!("{}\n", format_section_heading(path)));
        let pretty =
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
        out.push_str(&format!("{}\n\n", pretty));
    }
    out.push_str(&format!("Total: {} fragment(s)\n", dumped.len()));
    out
}

pub fn format_dump_json(dumped: &IndexMap<String, Value>) -> String {
    serde_json::to_string_pretty(dumped).unwrap_or_else(|_| "{}".to_string())
}

/// Render the winning items of `manifests` with their enablement and
/// feature selections. Shadowed declarations are not shown.
pub fn format_item_list_text(
    manifests: &[NormalizedManifest],
    state: &SelectionState,
) -> String {
    let winners = item_winners(manifests);
    if winners.is_empty() {
        return "No manifest items found.\n".to_string();
    }

    let mut out = format!("{}\n\n", format_section_heading("Items"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Item", "Enabled", "Feature", "Selected", "Options"]);

    let mut total = 0usize;
    for (idx, manifest) in manifests.iter().enumerate() {
        for (name, item) in &manifest.items {
            if winners.get(name.as_str()) != Some(&idx) {
                continue;
            }
            total += 1;
            let enabled = state.is_enabled(idx, name).unwrap_or(item.default_enabled);
            let enabled_str = if enabled { "yes" } else { "no" };
            if item.features.is_empty() {
                table.add_row(vec![
                    name.clone(),
                    enabled_str.to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]);
                continue;
            }
            for feature in &item.features {
                let selected = match state.selection(idx, name, &feature.name) {
                    Some(FeatureSelection::Single(Some(v))) => v.clone(),
                    Some(FeatureSelection::Single(None)) | None => "(none)".to_string(),
                    Some(FeatureSelection::Multi(vs)) if vs.is_empty() => "(none)".to_string(),
                    Some(FeatureSelection::Multi(vs)) => vs.join(", "),
                };
                let options: Vec<&str> =
                    feature.options.keys().map(|s| s.as_str()).collect();
                table.add_row(vec![
                    name.clone(),
                    enabled_str.to_string(),
                    feature.name.clone(),
                    selected,
                    options.join(", "),
                ]);
            }
        }
    }
    out.push_str(&format!("{}\n", table));
    out.push_str(&format!("\nTotal: {} item(s)\n", total));
    out
}

pub fn format_item_list_json(
    manifests: &[NormalizedManifest],
    state: &SelectionState,
) -> String {
    let winners = item_winners(manifests);
    let mut items = Vec::new();
    for (idx, manifest) in manifests.iter().enumerate() {
        for (name, item) in &manifest.items {
            if winners.get(name.as_str()) != Some(&idx) {
                continue;
            }
            let enabled = state.is_enabled(idx, name).unwrap_or(item.default_enabled);
            let features: Vec<Value> = item
                .features
                .iter()
                .map(|feature| {
                    let selected = match state.selection(idx, name, &feature.name) {
                        Some(FeatureSelection::Single(Some(v))) => json!(v),
                        Some(FeatureSelection::Single(None)) | None => Value::Null,
                        Some(FeatureSelection::Multi(vs)) => json!(vs),
                    };
                    let kind = match feature.kind {
                        FeatureKind::Single { .. } => "single",
                        FeatureKind::Multi { .. } => "multi",
                    };
                    let options: Vec<&str> =
                        feature.options.keys().map(|s| s.as_str()).collect();
                    json!({
                        "name": feature.name,
                        "kind": kind,
                        "selected": selected,
                        "options": options,
                    })
                })
                .collect();
            items.push(json!({
                "name": name,
                "title": item.title,
                "enabled": enabled,
                "source": manifest.source.to_string(),
                "features": features,
            }));
        }
    }
    let out = json!({ "items": items, "total": items.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_installs_text(targets: &[PathBuf]) -> String {
    if targets.is_empty() {
        return "No install directories found.\n".to_string();
    }
    let mut out = String::from("Discovered installs:\n");
    for target in targets {
        out.push_str(&format!("  {}\n", target.display()));
    }
    out.push_str(&format!("\nTotal: {} install(s)\n", targets.len()));
    out
}

pub fn format_installs_json(targets: &[PathBuf]) -> String {
    let paths: Vec<String> = targets.iter().map(|p| p.display().to_string()).collect();
    let out = json!({ "installs": paths, "total": targets.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_status_text(
    settings: &Settings,
    stats: &CacheStats,
    targets: &[PathBuf],
) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Sources"));
    let default_str = settings
        .sources
        .default
        .as_deref()
        .unwrap_or("(none)");
    out.push_str(&format!("  Default: {}\n", default_str));
    out.push_str(&format!("  Extra: {} source(s)\n", settings.sources.extra.len()));
    for url in &settings.sources.extra {
        out.push_str(&format!("    {}\n", url));
    }
    match &settings.sources.local_dir {
        Some(dir) => out.push_str(&format!("  Local dir: {}\n", dir.display())),
        None => out.push_str("  Local dir: (none)\n"),
    }

    out.push_str(&format!("\n{}\n\n", format_section_heading("Cache")));
    out.push_str(&format!("  Root: {}\n", settings.cache.resolved_root().display()));
    out.push_str(&format!(
        "  Entries: {} ({} bytes)\n",
        stats.entries, stats.total_bytes
    ));

    out.push_str(&format!("\n{}\n\n", format_section_heading("Selections")));
    if settings.selections.is_empty() {
        out.push_str("  No overrides persisted.\n");
    } else {
        for (item, over) in &settings.selections {
            let mut parts = Vec::new();
            if let Some(enabled) = over.enabled {
                parts.push(if enabled { "enabled".to_string() } else { "disabled".to_string() });
            }
            if !over.features.is_empty() {
                parts.push(format!("{} feature choice(s)", over.features.len()));
            }
            out.push_str(&format!("  {}: {}\n", item, parts.join(", ")));
        }
    }

    out.push_str(&format!("\n{}\n\n", format_section_heading("Installs")));
    if targets.is_empty() {
        out.push_str("  No install directories found.\n");
    } else {
        for target in targets {
            out.push_str(&format!("  {}\n", target.display()));
        }
    }
    out
}

pub fn format_status_json(
    settings: &Settings,
    stats: &CacheStats,
    targets: &[PathBuf],
) -> String {
    let installs: Vec<String> = targets.iter().map(|p| p.display().to_string()).collect();
    let out = json!({
        "sources": {
            "default": settings.sources.default,
            "extra": settings.sources.extra,
            "local_dir": settings.sources.local_dir.as_ref().map(|p| p.display().to_string()),
        },
        "cache": {
            "root": settings.cache.resolved_root().display().to_string(),
            "entries": stats.entries,
            "total_bytes": stats.total_bytes,
        },
        "selections": settings.selections.len(),
        "installs": installs,
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
