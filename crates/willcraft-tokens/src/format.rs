//! Grammatical list formatting for derived tokens.

/// Comma-joined: `"A, B, C"`.
pub fn inline(names: &[String]) -> String {
    names.join(", ")
}

/// Oxford style: `"A"`, `"A and B"`, `"A, B, and C"`.
pub fn inline_with_and(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [a, b] => format!("{a} and {b}"),
        _ => {
            let head = names[..names.len() - 1].join(", ");
            format!("{head}, and {}", names[names.len() - 1])
        }
    }
}

/// One `- Name` line per entry with a leading newline; empty string when
/// there are no entries.
pub fn bullet(names: &[String]) -> String {
    if names.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for name in names {
        out.push_str("\n- ");
        out.push_str(name);
    }
    out
}

/// Percentage display for a backup-charity split. Fixed fractions for one
/// to five entries regardless of the stored value; six or more show the
/// stored value at two decimals.
pub fn charity_share(stored_percent: f64, total: usize) -> String {
    match total {
        1 => "(100%)".to_string(),
        2 => "(50%)".to_string(),
        3 => "(1/3)".to_string(),
        4 => "(25%)".to_string(),
        5 => "(20%)".to_string(),
        _ => format!("({:.2}%)", stored_percent),
    }
}
