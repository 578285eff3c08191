//! Snapshot display formatting

use crate::backup::{RestorePreview, SnapshotInfo};

/// Format retained snapshots, newest first
pub fn format_snapshot_history(snapshots: &[SnapshotInfo]) -> String {
    if snapshots.is_empty() {
        return "No snapshots found.\nCreate one with: splitit backup create".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<4}  {:<13}  {:<19}  {:>8}  {:>10}\n",
        "#", "ID", "Created", "Records", "Size"
    ));
    output.push_str(&format!(
        "{:-<4}  {:-<13}  {:-<19}  {:->8}  {:->10}\n",
        "", "", "", "", ""
    ));

    for (i, snapshot) in snapshots.iter().enumerate() {
        output.push_str(&format!(
            "{:<4}  {:<13}  {:<19}  {:>8}  {:>10}\n",
            i + 1,
            snapshot.id.to_string(),
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"),
            snapshot.counts.total(),
            format_size(snapshot.size_bytes),
        ));
    }

    output.push_str(&format!("\nTotal: {} snapshot(s)\n", snapshots.len()));
    output
}

/// Format what a restore would do
pub fn format_preview(preview: &RestorePreview) -> String {
    let mut output = String::new();
    output.push_str(&format!("Restore preview ({})\n", preview.mode));
    output.push_str(&format!("  Contents:  {}\n", preview.counts));
    output.push_str(&format!("  Conflicts: {}\n", preview.conflicts));
    for conflict in &preview.conflicting {
        output.push_str(&format!("    {} {}\n", conflict.entity, conflict.id));
    }
    output
}

/// Human-readable byte size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
