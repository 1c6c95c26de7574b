use crate::ReplicateError;

/// Namespace root every logical file identifier is rebased onto.
pub const STORE_ROOT: &str = "/store";

/// Rewrite an identifier so it begins at the namespace root. The suffix
/// starting at the last occurrence of `/store` is kept; anything before it
/// (a caller's home-directory prefix, a mount point) is discarded. Inputs
/// without the marker are prefixed with the root. Idempotent.
pub fn normalize_lfn(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with(STORE_ROOT) {
        return raw.to_string();
    }
    match raw.rfind(STORE_ROOT) {
        Some(pos) => raw[pos..].to_string(),
        None => format!("{}{}", STORE_ROOT, raw),
    }
}

/// Parse one input-list line into `(lfn, expected_size)`.
///
/// Accepted shapes: `<lfn>` (size unknown, -1) or `<lfn> <size>`. Blank lines
/// yield `None`. Any other token count, or an unparsable size, is a fatal
/// error for the whole run — the list file itself is suspect.
pub fn parse_list_line(
    line_no: usize,
    line: &str,
) -> Result<Option<(String, i64)>, ReplicateError> {
    let cols: Vec<&str> = line.split_whitespace().collect();
    match cols.len() {
        0 => Ok(None),
        1 => Ok(Some((normalize_lfn(cols[0]), -1))),
        2 => {
            let size: i64 = cols[1]
                .parse()
                .map_err(|_| ReplicateError::BadListLine(line_no, line.trim().to_string()))?;
            Ok(Some((normalize_lfn(cols[0]), size)))
        }
        _ => Err(ReplicateError::BadListLine(line_no, line.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_home_prefix() {
        assert_eq!(normalize_lfn("/home/alice/store/a/b.root"), "/store/a/b.root");
    }

    #[test]
    fn normalize_keeps_last_marker() {
        assert_eq!(normalize_lfn("/xrootd/store/user/store/data.root"), "/store/data.root");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_lfn("/cms/ldap_home/bob/store/mc/run1.root");
        assert_eq!(once, "/store/mc/run1.root");
        assert_eq!(normalize_lfn(&once), once);
    }

    #[test]
    fn normalize_prefixes_bare_paths() {
        assert_eq!(normalize_lfn("/data/run2.root"), "/store/data/run2.root");
    }

    #[test]
    fn line_with_size() {
        let parsed = parse_list_line(1, "/store/a.root 1024").unwrap();
        assert_eq!(parsed, Some(("/store/a.root".to_string(), 1024)));
    }

    #[test]
    fn line_without_size_is_force_sentinel() {
        let parsed = parse_list_line(1, "/store/a.root").unwrap();
        assert_eq!(parsed, Some(("/store/a.root".to_string(), -1)));
    }

    #[test]
    fn blank_line_skipped() {
        assert_eq!(parse_list_line(4, "   ").unwrap(), None);
    }

    #[test]
    fn three_columns_rejected() {
        let err = parse_list_line(7, "/store/a.root 10 deadbeef").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn bad_size_rejected() {
        assert!(parse_list_line(2, "/store/a.root ten").is_err());
    }
}
