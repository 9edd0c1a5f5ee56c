// Filename handling for decoded payloads.

/// Name used when no usable filename can be derived.
pub const DEFAULT_FILENAME: &str = "decompressed";

/// Characters that are unsafe in a path segment on common filesystems.
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace reserved characters and C0 control characters (U+0000..U+001F)
/// with `_`.
///
/// ```
/// use metagz::container::filename::sanitize;
/// assert_eq!(sanitize("a<b>c:d\"e"), "a_b_c_d_e");
/// ```
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if RESERVED.contains(&c) || (c as u32) < 0x20 {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Strip one trailing `.gz` (case-sensitive).
pub fn strip_gz_suffix(name: &str) -> &str {
    name.strip_suffix(".gz").unwrap_or(name)
}

/// Filename for a payload recovered from a bare gzip or deflate stream.
///
/// Uses the caller's filename with one `.gz` removed, or
/// [`DEFAULT_FILENAME`] when that leaves nothing.
pub fn fallback_name(fallback: &str) -> String {
    match strip_gz_suffix(fallback) {
        "" => DEFAULT_FILENAME.to_owned(),
        name => name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_characters_replaced() {
        assert_eq!(sanitize("a<b>c:d\"e"), "a_b_c_d_e");
        assert_eq!(sanitize("dir/sub\\file|x?y*z"), "dir_sub_file_x_y_z");
    }

    #[test]
    fn control_characters_replaced() {
        assert_eq!(sanitize("tab\there\nnul\0end"), "tab_here_nul_end");
        assert_eq!(sanitize("\u{1f}"), "_");
        // DEL and non-ASCII are left alone.
        assert_eq!(sanitize("x\u{7f}"), "x\u{7f}");
        assert_eq!(sanitize("résumé 報告.pdf"), "résumé 報告.pdf");
    }

    #[test]
    fn safe_names_unchanged() {
        assert_eq!(sanitize("hi.txt"), "hi.txt");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn gz_suffix_stripped_once() {
        assert_eq!(strip_gz_suffix("data.txt.gz"), "data.txt");
        assert_eq!(strip_gz_suffix("data.gz.gz"), "data.gz");
        assert_eq!(strip_gz_suffix("data.GZ"), "data.GZ");
        assert_eq!(strip_gz_suffix("data.tgz"), "data.tgz");
        assert_eq!(strip_gz_suffix("gz"), "gz");
    }

    #[test]
    fn fallback_never_empty() {
        assert_eq!(fallback_name("notes.txt.gz"), "notes.txt");
        assert_eq!(fallback_name("notes.bin"), "notes.bin");
        assert_eq!(fallback_name(".gz"), DEFAULT_FILENAME);
        assert_eq!(fallback_name(""), DEFAULT_FILENAME);
    }
}
