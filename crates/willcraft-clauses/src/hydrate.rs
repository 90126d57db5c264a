//! Template hydration.
//!
//! Clause bodies carry `[[Token]]` placeholders. Hydration substitutes every
//! token present in the map and leaves unresolved placeholders as literal
//! `[[Token]]` text so gaps stay visible in the rendered document.

use std::collections::BTreeMap;

/// Token name to rendered text. BTreeMap keeps dumps deterministic.
pub type TokenMap = BTreeMap<String, String>;

/// Substitute `[[Token]]` placeholders in a clause body.
///
/// A `[[` without a matching `]]` is treated as literal text. Replacement is
/// single-pass: token values containing `[[...]]` are not re-expanded.
pub fn hydrate_body(body: &str, tokens: &TokenMap) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(open) = rest.find("[[") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("]]") {
            Some(close) => {
                let name = &after_open[..close];
                match tokens.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("[[");
                        out.push_str(name);
                        out.push_str("]]");
                    }
                }
                rest = &after_open[close + 2..];
            }
            None => {
                // Unterminated placeholder; keep the rest verbatim.
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, &str)]) -> TokenMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn substitutes_every_occurrence() {
        let map = tokens(&[("ClientFullName", "Avery Quinn")]);
        let body = "I, [[ClientFullName]], declare. Signed, [[ClientFullName]].";
        assert_eq!(
            hydrate_body(body, &map),
            "I, Avery Quinn, declare. Signed, Avery Quinn."
        );
    }

    #[test]
    fn unresolved_tokens_stay_visible() {
        let map = tokens(&[("SpouseName", "Jordan")]);
        assert_eq!(
            hydrate_body("To [[SpouseName]] and [[GuardianName]].", &map),
            "To Jordan and [[GuardianName]]."
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let map = tokens(&[("X", "y")]);
        assert_eq!(hydrate_body("a [[X]] b [[broken", &map), "a y b [[broken");
    }

    #[test]
    fn values_are_not_re_expanded() {
        let map = tokens(&[("A", "[[B]]"), ("B", "nope")]);
        assert_eq!(hydrate_body("[[A]]", &map), "[[B]]");
    }
}
