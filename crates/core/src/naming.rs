use url::Url;

/// Millisecond timestamp used for synthesized scratch and logical names.
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Base name of a logical filename: everything before the final extension.
fn base_name(logical: &str) -> &str {
    match logical.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => logical,
    }
}

/// Deterministic output name: `<base>-<suffix>.<ext>`.
///
/// A pure function of the logical input name and the operation; re-running
/// the same operation on the same logical name maps to the same output and
/// overwrites it.
pub fn output_filename(logical: &str, suffix: &str, ext: &str) -> String {
    format!("{}-{}.{}", base_name(logical), suffix, ext)
}

/// Logical filename for a URL-sourced image: the URL path's basename when it
/// carries an extension, otherwise a synthesized `image-<millis>.<ext>`.
pub fn remote_logical_filename(image_url: &str, ext: &str, millis: i64) -> String {
    if let Ok(parsed) = Url::parse(image_url) {
        if let Some(basename) = parsed.path().rsplit('/').next() {
            if !basename.is_empty() && basename.contains('.') {
                return basename.to_string();
            }
        }
    }
    format!("image-{millis}.{ext}")
}
