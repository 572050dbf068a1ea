/// Base name used when the original file name has nothing usable left.
const FALLBACK_BASE_NAME: &str = "converted";

/// Derive the saved file name: `<original name without its extension>.<target>`.
///
/// Only the final path component of `file_name` is used. The extension is
/// whatever follows the last dot; a leading dot (as in `.bashrc`) does not
/// start an extension.
pub fn download_file_name(file_name: &str, target_format: &str) -> String {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let base = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    let base = if base.is_empty() {
        FALLBACK_BASE_NAME
    } else {
        base
    };

    format!("{}.{}", base, target_format.trim_start_matches('.'))
}
