use console::style;
use similar::{ChangeTag, TextDiff};

const CONTEXT_LINES: usize = 2;

/// Renders a colored, line-based diff of an edit for the operator.
///
/// Hunks are separated by `...`; removed lines are red, added lines green.
pub fn generate_diff(old: &str, new: &str) -> String {
    if old == new {
        return "No changes detected.".to_string();
    }

    let diff = TextDiff::from_lines(old, new);
    let mut diff_lines = Vec::new();

    for (hunk_idx, group) in diff.grouped_ops(CONTEXT_LINES).iter().enumerate() {
        if hunk_idx > 0 {
            diff_lines.push("...".to_string());
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let text = change.value().trim_end_matches(['\r', '\n']);
                let line = match change.tag() {
                    ChangeTag::Delete => style(format!("- {text}")).red().to_string(),
                    ChangeTag::Insert => style(format!("+ {text}")).green().to_string(),
                    ChangeTag::Equal => format!("  {text}"),
                };
                diff_lines.push(line);
            }
        }
    }
    diff_lines.join("\n")
}
