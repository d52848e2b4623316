//! Output formatting for CLI operations.

use std::path::Path;

use rezip::{EditResult, Entry, UnpackResult};
use serde_json::json;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, entries: &[Entry], technical: bool) -> String;

    /// Formats the result of a mutation
    fn format_edit_result(&self, operation: &str, archive: &Path, result: &EditResult) -> String;

    /// Formats unpack results
    fn format_unpack_result(&self, dest: &Path, result: &UnpackResult) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, entries: &[Entry], technical: bool) -> String {
        let mut output = String::new();

        // Header
        if technical {
            output.push_str(&format!(
                "{:>12} {:>12} {:>10} {}\n",
                "Size", "Packed", "CRC", "Name"
            ));
        } else {
            output.push_str(&format!("{:>12} {}\n", "Size", "Name"));
        }
        output.push_str(&"-".repeat(60));
        output.push('\n');

        let mut total_size: u64 = 0;
        let mut file_count = 0;
        let mut dir_count = 0;

        for entry in entries {
            let size_str = if entry.is_directory {
                dir_count += 1;
                String::new()
            } else {
                file_count += 1;
                total_size += entry.size;
                humanize_bytes(entry.size)
            };

            if technical {
                output.push_str(&format!(
                    "{:>12} {:>12} {:>10} {}\n",
                    size_str,
                    humanize_bytes(entry.compressed_size),
                    format!("{:08X}", entry.crc32),
                    entry.name
                ));
            } else {
                output.push_str(&format!("{:>12} {}\n", size_str, entry.name));
            }
        }

        // Footer
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "{} files, {} directories, {} total\n",
            file_count,
            dir_count,
            humanize_bytes(total_size)
        ));

        output
    }

    fn format_edit_result(&self, operation: &str, archive: &Path, result: &EditResult) -> String {
        let mut output = format!(
            "{}: {} ({} entries)\n",
            operation,
            archive.display(),
            result.total_entries()
        );
        if result.is_unchanged() {
            output.push_str("  No changes\n");
            return output;
        }
        for (label, count) in [
            ("Added", result.entries_added),
            ("Removed", result.entries_deleted),
            ("Replaced", result.entries_updated),
            ("Renamed", result.entries_renamed),
        ] {
            if count > 0 {
                output.push_str(&format!("  {:<10}{}\n", format!("{}:", label), count));
            }
        }
        output
    }

    fn format_unpack_result(&self, dest: &Path, result: &UnpackResult) -> String {
        let mut output = format!(
            "Unpacked {} files ({}) into {}\n",
            result.entries_extracted,
            humanize_bytes(result.bytes_extracted),
            dest.display()
        );
        if result.directories_created > 0 {
            output.push_str(&format!("Created {} directories\n", result.directories_created));
        }
        if result.entries_skipped > 0 {
            output.push_str(&format!("Skipped {} existing files\n", result.entries_skipped));
        }
        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, entries: &[Entry], _technical: bool) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "size": e.size,
                    "compressed_size": e.compressed_size,
                    "crc32": e.crc32,
                    "is_directory": e.is_directory,
                    "is_symlink": e.is_symlink(),
                })
            })
            .collect();

        serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string()) + "\n"
    }

    fn format_edit_result(&self, operation: &str, archive: &Path, result: &EditResult) -> String {
        let obj = json!({
            "operation": operation,
            "archive": archive.display().to_string(),
            "entries_kept": result.entries_kept,
            "entries_added": result.entries_added,
            "entries_deleted": result.entries_deleted,
            "entries_updated": result.entries_updated,
            "entries_renamed": result.entries_renamed,
            "bytes_written": result.bytes_written,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string()) + "\n"
    }

    fn format_unpack_result(&self, dest: &Path, result: &UnpackResult) -> String {
        let obj = json!({
            "destination": dest.display().to_string(),
            "entries_extracted": result.entries_extracted,
            "directories_created": result.directories_created,
            "entries_skipped": result.entries_skipped,
            "bytes_extracted": result.bytes_extracted,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string()) + "\n"
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
