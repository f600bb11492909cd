//! Project name derivation and sanitizing.

/// Prefix shared by every project this hub creates.
pub const PROJECT_PREFIX: &str = "depin";

/// Number of workload-id characters appended for collision resistance.
const ID_SLICE_LEN: usize = 8;

/// Restrict a name to lowercase ASCII alphanumerics and hyphens.
///
/// Every other character becomes `-`. Leading hyphens are dropped because
/// compose requires names to start with a letter or digit.
pub fn sanitize_project_name(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let trimmed = mapped.trim_start_matches('-');
    if trimmed.is_empty() {
        PROJECT_PREFIX.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the project name for a new installation.
///
/// `depin-<display name>-<first 8 chars of id>`, sanitized. Called once at
/// install time; the result is persisted and reused for the lifetime of the
/// installation.
pub fn generate_project_name(display_name: &str, workload_id: &str) -> String {
    let id_slice: String = workload_id.chars().take(ID_SLICE_LEN).collect();
    sanitize_project_name(&format!("{PROJECT_PREFIX}-{display_name}-{id_slice}"))
}
