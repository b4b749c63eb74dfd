//! Utility functions for path handling and caption styling.

use std::path::PathBuf;

/// Constructs a file system path by joining a directory path with a file name.
///
/// # Arguments
///
/// * `dir_path` - The base directory path
/// * `file_path` - The file or subdirectory name to append
///
/// # Examples
///
/// ```ignore
/// let path = get_path("./lang", "en.json");
/// assert_eq!(path, "./lang/en.json");
/// ```
pub fn get_path(dir_path: &str, file_path: &str) -> String {
    let path_buf: PathBuf = [dir_path, file_path].iter().collect();
    path_buf.to_string_lossy().into_owned()
}

/// Derives a stable hue from a name, used to colour player and location names.
///
/// Each UTF-16 code unit is weighted by `1 - i / 12` where `i` is its position, so the
/// first characters dominate. The result is not normalized: CSS wraps hues modulo 360.
pub fn string_to_hue(name: &str) -> f64 {
    name.encode_utf16()
        .enumerate()
        .map(|(i, unit)| f64::from(unit) * (1.0 - i as f64 / 12.0))
        .sum()
}
