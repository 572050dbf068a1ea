//! Format catalog - which source formats are accepted and what each may be
//! converted to.
//!
//! Pure lookups over static tables. The backend remains the authority on what
//! it can actually convert; this catalog only constrains what the client
//! offers.

mod tables;
mod types;

pub use types::*;

use tables::{FORMAT_LABELS, INPUT_FORMATS, OUTPUT_FORMATS};

/// All accepted source formats, in display order.
pub fn input_formats() -> &'static [InputFormat] {
    INPUT_FORMATS
}

/// Look up an accepted source format by MIME type.
pub fn input_format(mime_type: &str) -> Option<&'static InputFormat> {
    INPUT_FORMATS.iter().find(|f| f.mime_type == mime_type)
}

/// Ordered conversion targets for a source MIME type.
///
/// Returns an empty list when the source format is not recognized.
pub fn output_formats_for(source_mime: &str) -> Vec<FormatOption> {
    OUTPUT_FORMATS
        .iter()
        .find(|(mime, _)| *mime == source_mime)
        .map(|(_, targets)| {
            targets
                .iter()
                .map(|t| FormatOption {
                    value: (*t).to_string(),
                    label: format_label(t),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Whether `target` is listed for `source_mime`.
pub fn is_conversion_supported(source_mime: &str, target: &str) -> bool {
    OUTPUT_FORMATS
        .iter()
        .find(|(mime, _)| *mime == source_mime)
        .is_some_and(|(_, targets)| targets.contains(&target))
}

/// Display label for a format token, falling back to the upper-cased token.
pub fn format_label(token: &str) -> String {
    FORMAT_LABELS
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| token.to_uppercase())
}

/// Group a MIME type into a broad category.
pub fn file_category(mime_type: &str) -> FileCategory {
    if mime_type.starts_with("image/") {
        FileCategory::Image
    } else if mime_type.starts_with("video/") || mime_type.starts_with("audio/") {
        FileCategory::Media
    } else {
        FileCategory::Document
    }
}

/// Infer an accepted source MIME type from a file extension (case-insensitive).
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    INPUT_FORMATS
        .iter()
        .find(|f| f.extensions.contains(&extension.as_str()))
        .map(|f| f.mime_type)
}

/// Human-readable byte size, e.g. "0 B", "1.5 KB", "500 MB".
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{:.1}", value);
    let rendered = rendered.strip_suffix(".0").unwrap_or(&rendered);
    format!("{} {}", rendered, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_input_format_has_targets() {
        for format in input_formats() {
            assert!(
                !output_formats_for(format.mime_type).is_empty(),
                "no targets for {}",
                format.mime_type
            );
        }
        assert_eq!(input_formats().len(), 26);
    }

    #[test]
    fn test_output_formats_preserve_order_and_labels() {
        let formats = output_formats_for("image/png");
        let values: Vec<_> = formats.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["jpg", "gif", "webp", "bmp", "tiff", "pdf"]);
        assert_eq!(formats[0].label, "JPEG");
        assert_eq!(formats[2].label, "WebP");
    }

    #[test]
    fn test_output_formats_unknown_source_is_empty() {
        assert!(output_formats_for("application/x-unknown").is_empty());
        assert!(output_formats_for("").is_empty());
    }

    #[test]
    fn test_format_label_fallback() {
        assert_eq!(format_label("md"), "Markdown");
        assert_eq!(format_label("heic"), "HEIC");
    }

    #[test]
    fn test_is_conversion_supported() {
        assert!(is_conversion_supported("audio/flac", "mp3"));
        assert!(!is_conversion_supported("audio/flac", "flac"));
        assert!(!is_conversion_supported("audio/unknown", "mp3"));
    }

    #[test]
    fn test_file_category() {
        assert_eq!(file_category("image/webp"), FileCategory::Image);
        assert_eq!(file_category("video/mp4"), FileCategory::Media);
        assert_eq!(file_category("audio/ogg"), FileCategory::Media);
        assert_eq!(file_category("text/csv"), FileCategory::Document);
        assert_eq!(file_category("application/pdf"), FileCategory::Document);
    }

    #[test]
    fn test_mime_type_for_extension() {
        assert_eq!(mime_type_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_type_for_extension(".md"), Some("text/markdown"));
        assert_eq!(
            mime_type_for_extension("docx"),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
        assert_eq!(mime_type_for_extension("exe"), None);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(500 * 1024 * 1024), "500 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024 * 1024), "3072 GB");
    }
}
