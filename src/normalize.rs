//! Cleanup of markdown artifacts in model output.

use once_cell::sync::Lazy;
use regex::Regex;

// `[^\S\n]` is any whitespace except a newline, so indentation such as a
// non-breaking space counts the same way `trim` does.
static LIST_DASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[^\S\n]*(?:-[^\S\n]+)+").unwrap());

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Strips code fences, bold/emphasis markers and list dashes, then collapses
/// blank lines and trims.
///
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(raw: &str) -> String {
    // Stars go first: removing them can join backtick runs into a new fence.
    let text = raw.replace("**", "").replace('*', "").replace("```", "");
    let text = LIST_DASH_RE.replace_all(&text, "");
    let text = BLANK_RUN_RE.replace_all(&text, "\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_artifacts() {
        let raw = "```\n**Scene:** a *red* kite\n```\n\n- over the sea\n- near a *pier*\n";
        let out = normalize(raw);
        assert!(!out.contains("```"));
        assert!(!out.contains('*'));
        assert_eq!(out, "Scene: a red kite\nover the sea\nnear a pier");
    }

    #[test]
    fn keeps_inline_hyphens() {
        assert_eq!(normalize("a well-lit room - mostly empty"), "a well-lit room - mostly empty");
    }

    #[test]
    fn collapses_blank_runs_and_trims() {
        assert_eq!(normalize("\n\n  one\n\n \n\t\ntwo  \n\n"), "one\ntwo");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \n\n "), "");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "**bold** and *item* and ```code```",
            "- - nested dash\n\n\n  - indented\n-*- odd",
            "```json\n{\"a\": 1}\n```\n\n\n\n*",
            "line one\r\n\r\n- line two",
            "   \t  ",
            "`*``",
            "``**`",
            "\u{a0}- item",
            "a\n\u{2003}-\u{a0}b",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "input {sample:?}");
        }
    }

    #[test]
    fn marker_removal_never_leaves_new_markers() {
        assert_eq!(normalize("`*``"), "");
        assert_eq!(normalize("\u{a0}- item"), "item");
    }

    #[test]
    fn is_idempotent_for_every_short_input() {
        const ALPHABET: [char; 8] = ['`', '*', '-', ' ', '\n', '\u{a0}', '\t', 'a'];
        let mut inputs = vec![String::new()];
        let mut frontier = inputs.clone();
        for _ in 0..5 {
            frontier = frontier
                .iter()
                .flat_map(|s| ALPHABET.iter().map(move |c| format!("{s}{c}")))
                .collect();
            inputs.extend(frontier.iter().cloned());
        }
        for input in &inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }
}
