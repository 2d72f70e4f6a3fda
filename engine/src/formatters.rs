//! Message formatting helpers

/// Human-readable duration: "45 minutes", "1 hour", "2 hours 15 minutes".
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        format!("{} minutes", minutes)
    } else if minutes == 60 {
        "1 hour".to_string()
    } else {
        let hours = minutes / 60;
        let rest = minutes % 60;
        if rest == 0 {
            format!("{} hours", hours)
        } else {
            format!("{} hours {} minutes", hours, rest)
        }
    }
}

/// Comma-join a list of names or emails for display.
pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45 minutes");
        assert_eq!(format_duration(60), "1 hour");
        assert_eq!(format_duration(120), "2 hours");
        assert_eq!(format_duration(135), "2 hours 15 minutes");
    }

    #[test]
    fn test_join_list() {
        assert_eq!(
            join_list(&["a@x.com".to_string(), "b@x.com".to_string()]),
            "a@x.com, b@x.com"
        );
    }
}
