/// Extensions accepted by the upload form.
pub const ALLOWED_EXTENSIONS: &[&str] = &["json"];

/// Returns `true` when the file name carries an allowed extension
/// (case-insensitive).
pub fn allowed_file(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, extension)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension)),
        None => false,
    }
}

/// Reduces a client-supplied file name to a flat, ASCII-only name that is safe
/// to join onto a server directory. The result may be empty.
pub fn secure_filename(file_name: &str) -> String {
    let spaced: String = file_name
        .chars()
        .map(|ch| if ch == '/' || ch == '\\' { ' ' } else { ch })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|ch| ch == '.' || ch == '_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(allowed_file("dump.json"));
        assert!(allowed_file("dump.JSON"));
        assert!(allowed_file("archive.2024.json"));
        assert!(!allowed_file("dump.csv"));
        assert!(!allowed_file("json"));
        assert!(!allowed_file("dump.json.exe"));
    }

    #[test]
    fn secure_filename_flattens_paths() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\windows\\dump.json"), "windows_dump.json");
        assert_eq!(secure_filename("my breach dump.json"), "my_breach_dump.json");
    }

    #[test]
    fn secure_filename_drops_unsafe_characters() {
        assert_eq!(secure_filename("dümp$.json"), "dmp.json");
        assert_eq!(secure_filename(".hidden.json"), "hidden.json");
        assert_eq!(secure_filename("..."), "");
    }
}
