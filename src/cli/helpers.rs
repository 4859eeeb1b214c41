//! Shared helper functions for CLI commands

/// Format a document id for display, truncating if too long
///
/// Ids longer than 16 characters are cut to 13 with a "..." suffix.
pub fn format_short_id(id: &str) -> String {
    truncate_str(id, 16)
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Parse a comma-separated list of checklist item ids, e.g. `3,7,12`
pub fn parse_item_ids(list: &str) -> Result<Vec<u32>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| format!("'{}' is not a checklist item number", s))
        })
        .collect()
}

/// Parse `ID=TEXT` as used by `--comment 4="Tongs missing"`
pub fn parse_item_comment(arg: &str) -> Result<(u32, String), String> {
    let (id, text) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected ITEM=TEXT, got '{}'", arg))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("'{}' is not a checklist item number", id.trim()))?;
    Ok((id, text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_id() {
        assert_eq!(format_short_id("SHORT"), "SHORT");
        assert_eq!(format_short_id("INSP-01J123456789ABCDEF123456"), "INSP-01J12345...");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("Café Olé!", 7), "Café...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_parse_item_ids() {
        assert_eq!(parse_item_ids("3, 7,12").unwrap(), vec![3, 7, 12]);
        assert_eq!(parse_item_ids("").unwrap(), Vec::<u32>::new());
        assert!(parse_item_ids("3,x").is_err());
    }

    #[test]
    fn test_parse_item_comment() {
        assert_eq!(
            parse_item_comment("4=Tongs = missing").unwrap(),
            (4, "Tongs = missing".to_string())
        );
        assert!(parse_item_comment("no-equals").is_err());
        assert!(parse_item_comment("x=text").is_err());
    }
}
