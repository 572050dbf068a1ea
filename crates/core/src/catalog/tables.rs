//! Static format tables.

use super::InputFormat;

const fn input(
    mime_type: &'static str,
    label: &'static str,
    extensions: &'static [&'static str],
) -> InputFormat {
    InputFormat {
        mime_type,
        label,
        extensions,
    }
}

pub(super) const INPUT_FORMATS: &[InputFormat] = &[
    // Images
    input("image/jpeg", "JPEG Image", &["jpg", "jpeg"]),
    input("image/png", "PNG Image", &["png"]),
    input("image/gif", "GIF Image", &["gif"]),
    input("image/webp", "WebP Image", &["webp"]),
    input("image/bmp", "BMP Image", &["bmp"]),
    input("image/tiff", "TIFF Image", &["tiff", "tif"]),
    // Documents
    input("application/pdf", "PDF Document", &["pdf"]),
    input("application/msword", "Word (DOC)", &["doc"]),
    input(
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "Word (DOCX)",
        &["docx"],
    ),
    input("application/vnd.ms-excel", "Excel (XLS)", &["xls"]),
    input(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "Excel (XLSX)",
        &["xlsx"],
    ),
    input("application/vnd.ms-powerpoint", "PowerPoint (PPT)", &["ppt"]),
    input(
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "PowerPoint (PPTX)",
        &["pptx"],
    ),
    input("text/plain", "Text File", &["txt"]),
    input("text/html", "HTML File", &["html", "htm"]),
    input("text/markdown", "Markdown", &["md", "markdown"]),
    input("text/csv", "CSV File", &["csv"]),
    // Media
    input("video/mp4", "MP4 Video", &["mp4", "m4v"]),
    input("video/webm", "WebM Video", &["webm"]),
    input("video/quicktime", "MOV Video", &["mov"]),
    input("video/x-msvideo", "AVI Video", &["avi"]),
    input("video/x-matroska", "MKV Video", &["mkv"]),
    input("audio/mpeg", "MP3 Audio", &["mp3"]),
    input("audio/wav", "WAV Audio", &["wav"]),
    input("audio/ogg", "OGG Audio", &["ogg", "oga"]),
    input("audio/flac", "FLAC Audio", &["flac"]),
];

/// Source MIME type -> ordered target tokens.
pub(super) const OUTPUT_FORMATS: &[(&str, &[&str])] = &[
    ("image/jpeg", &["png", "gif", "webp", "bmp", "tiff", "pdf"]),
    ("image/png", &["jpg", "gif", "webp", "bmp", "tiff", "pdf"]),
    ("image/gif", &["jpg", "png", "webp", "bmp", "tiff", "pdf"]),
    ("image/webp", &["jpg", "png", "gif", "bmp", "tiff", "pdf"]),
    ("image/bmp", &["jpg", "png", "gif", "webp", "tiff", "pdf"]),
    ("image/tiff", &["jpg", "png", "gif", "webp", "bmp", "pdf"]),
    ("application/pdf", &["docx", "txt", "html"]),
    ("application/msword", &["pdf", "docx", "txt", "html", "odt"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["pdf", "doc", "txt", "html", "odt"],
    ),
    ("application/vnd.ms-excel", &["pdf", "xlsx", "csv", "ods"]),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &["pdf", "xls", "csv", "ods"],
    ),
    ("application/vnd.ms-powerpoint", &["pdf", "pptx", "odp"]),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        &["pdf", "ppt", "odp"],
    ),
    ("text/plain", &["pdf", "html", "docx"]),
    ("text/html", &["pdf", "docx", "txt", "md"]),
    ("text/markdown", &["pdf", "html", "docx", "txt"]),
    ("text/csv", &["xlsx", "xls", "pdf"]),
    ("video/mp4", &["webm", "avi", "mkv", "mov", "mp3", "wav"]),
    ("video/webm", &["mp4", "avi", "mkv", "mov", "mp3", "wav"]),
    ("video/quicktime", &["mp4", "webm", "avi", "mkv", "mp3", "wav"]),
    ("video/x-msvideo", &["mp4", "webm", "mkv", "mov", "mp3", "wav"]),
    ("video/x-matroska", &["mp4", "webm", "avi", "mov", "mp3", "wav"]),
    ("audio/mpeg", &["wav", "ogg", "flac", "aac", "m4a"]),
    ("audio/wav", &["mp3", "ogg", "flac", "aac", "m4a"]),
    ("audio/ogg", &["mp3", "wav", "flac", "aac", "m4a"]),
    ("audio/flac", &["mp3", "wav", "ogg", "aac", "m4a"]),
];

pub(super) const FORMAT_LABELS: &[(&str, &str)] = &[
    ("jpg", "JPEG"),
    ("jpeg", "JPEG"),
    ("png", "PNG"),
    ("gif", "GIF"),
    ("webp", "WebP"),
    ("bmp", "BMP"),
    ("tiff", "TIFF"),
    ("pdf", "PDF"),
    ("doc", "DOC"),
    ("docx", "DOCX"),
    ("xls", "XLS"),
    ("xlsx", "XLSX"),
    ("ppt", "PPT"),
    ("pptx", "PPTX"),
    ("odt", "ODT"),
    ("ods", "ODS"),
    ("odp", "ODP"),
    ("txt", "TXT"),
    ("html", "HTML"),
    ("md", "Markdown"),
    ("csv", "CSV"),
    ("mp4", "MP4"),
    ("webm", "WebM"),
    ("avi", "AVI"),
    ("mkv", "MKV"),
    ("mov", "MOV"),
    ("mp3", "MP3"),
    ("wav", "WAV"),
    ("ogg", "OGG"),
    ("flac", "FLAC"),
    ("aac", "AAC"),
    ("m4a", "M4A"),
    ("rst", "RST"),
    ("epub", "EPUB"),
];
