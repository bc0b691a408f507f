/// Collapse every run of whitespace (including NBSP, figure space and
/// narrow NBSP) into a single ASCII space and trim both ends.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_runs_and_trims() {
        assert_eq!(normalize("  CS 4100.\n\tFoundations   of AI.  "), "CS 4100. Foundations of AI.");
    }

    #[test]
    fn unicode_spaces_become_ascii() {
        assert_eq!(normalize("CS\u{00A0}4100.\u{2007}Intro\u{202F}AI"), "CS 4100. Intro AI");
    }

    #[test]
    fn only_spaces_is_empty() {
        assert_eq!(normalize("\u{00A0} \u{2007}\n\r\t\u{202F}  "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "",
            "plain",
            "  a\u{00A0}\u{00A0}b \n c ",
            "CS 1234. A. (4) text1\r\n\r\nCS 5678. B. (4) text2",
            "\u{202F}lead and trail\u{2007}",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {:?}", s);
        }
    }

    #[test]
    fn leaves_case_and_punctuation() {
        assert_eq!(normalize("Prerequisite(s):  cs 2500."), "Prerequisite(s): cs 2500.");
    }

    #[test]
    fn absent_passes_through() {
        let missing: Option<&str> = None;
        assert_eq!(missing.map(normalize), None);
    }
}
