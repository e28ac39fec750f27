//! Cleanup for model-produced documents that must be stored verbatim.

/// Drop every line that contains a markdown code fence.
///
/// Spec documents come back wrapped in ```` ```yaml ```` fences, sometimes with
/// prose around them. Only the fence lines are removed; the rest is kept so a
/// human can review it.
pub fn strip_fence_lines(input: &str) -> String {
    input
        .split('\n')
        .filter(|line| !line.contains("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefix a generated `cases:` document with the subject it was generated for.
pub fn with_subject_header(subject: &str, cases_yaml: &str) -> String {
    format!("testing: {subject}\n{cases_yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_and_keeps_content() {
        let input = "```yaml\ncases:\n  - name: TestA\n```";
        assert_eq!(strip_fence_lines(input), "cases:\n  - name: TestA");
    }

    #[test]
    fn leaves_unfenced_text_untouched() {
        let input = "cases:\n  - name: TestA\n";
        assert_eq!(strip_fence_lines(input), input);
    }

    #[test]
    fn header_precedes_cases() {
        let doc = with_subject_header("Cache.Get", "cases: []\n");
        assert_eq!(doc, "testing: Cache.Get\ncases: []\n");
    }
}
