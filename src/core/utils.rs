/// Extensions kept as-is by `normalize_filename`.
const KNOWN_EXTENSIONS: &[&str] = &[".mp4", ".mkv", ".webm"];

/// Extension appended when the title carries none of `KNOWN_EXTENSIONS`.
const DEFAULT_EXTENSION: &str = ".mp4";

/// Stem used when nothing of the title survives normalization.
const FALLBACK_STEM: &str = "video";

/// Turns a video title into the on-disk filename for the transfer.
///
/// Keeps only alphanumeric characters, whitespace, `-`, `.`, `(` and `)`;
/// collapses whitespace runs to a single space, trims both ends and makes
/// sure the name ends in `.mp4`, `.mkv` or `.webm` (case-insensitive),
/// appending `.mp4` otherwise.
///
/// # Example
///
/// ```
/// use tubeloader::core::utils::normalize_filename;
///
/// assert_eq!(normalize_filename("Test Video: A/B?"), "Test Video AB.mp4");
/// assert_eq!(normalize_filename("clip.WEBM"), "clip.WEBM");
/// ```
pub fn normalize_filename(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '.' | '(' | ')'))
        .collect();

    let mut filename = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if filename.is_empty() {
        filename.push_str(FALLBACK_STEM);
    }

    let lower = filename.to_lowercase();
    if !KNOWN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        filename.push_str(DEFAULT_EXTENSION);
    }

    filename
}

/// Renders a byte count with binary units.
///
/// Below 1024 the exact count is shown (`"512 B"`); larger values are
/// divided by 1024 until they fit and shown with one decimal (`"1.5 KB"`).
///
/// # Example
///
/// ```
/// use tubeloader::core::utils::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 B");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < PREFIXES.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}
