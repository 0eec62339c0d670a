use std::path::{Path, PathBuf};

/// Lower-cases `segment` and drops everything but letters, digits,
/// underscores, hyphens and spaces.
pub fn sanitize_segment(segment: &str) -> String {
    segment
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect()
}

pub fn device_page_url(base_url: &str, vendor: &str, device: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), vendor, device)
}

pub fn source_url(index_page_url: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        index_page_url.trim_end_matches('/'),
        file_name.trim_start_matches('/')
    )
}

pub fn target_dir(root: &Path, vendor: &str, device: &str, game: &str) -> PathBuf {
    root.join(sanitize_segment(vendor))
        .join(sanitize_segment(device))
        .join(sanitize_segment(game))
}

/// Name the link is saved under: its last path segment, otherwise untouched.
pub fn local_file_name(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}
