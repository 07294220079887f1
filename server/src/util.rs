//! Shared utility functions

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

/// Format a byte count in human-readable units, used by upload-limit
/// error messages.
///
/// # Examples
///
/// ```
/// use amity_server::util::format_file_size;
///
/// assert_eq!(format_file_size(512), "512 bytes");
/// assert_eq!(format_file_size(3 * 1024), "3KB");
/// assert_eq!(format_file_size(2 * 1024 * 1024), "2.0MB");
/// ```
pub fn format_file_size(bytes: usize) -> String {
    match bytes {
        b if b < KIB => format!("{b} bytes"),
        b if b < MIB => format!("{}KB", b / KIB),
        b => format!("{:.1}MB", b as f64 / MIB as f64),
    }
}
