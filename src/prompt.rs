//! Review prompt assembly.
//!
//! Concatenates the instruction preamble, the verifier report, and a
//! capped excerpt of every eligible changed file into one prompt string.
//! Deterministic given identical file-system state, and never fails:
//! per-file read errors become placeholder blocks inside the prompt.

use std::fmt::Write;

/// Changed files under the CI configuration directory are not reviewed.
const CI_CONFIG_PREFIX: &str = ".github/";

/// Suffixes the reviewer cannot usefully read.
const BINARY_SUFFIXES: [&str; 4] = [".png", ".jpg", ".gif", ".bin"];

/// Cap on lines excerpted per file, bounding prompt size.
const MAX_EXCERPT_LINES: usize = 100;

/// Fixed instruction preamble: reviewer framing, verifier-errors-first
/// priority, and the complete-HTML-only output mandate.
const INSTRUCTIONS: &str = "You are an expert in code review and strict typing (Typy). \
Your task is to analyze the following code changes, focusing on quality, consistency, \
potential errors, and improvements. \
**Absolute priority:** if the 'Typy Verification Report' below contains errors, you must \
highlight them and explain clearly to the developer how to fix them so the push is accepted. \
After the analysis, you must respond **only** with complete, polished HTML for a feedback \
email. The email must look professional and friendly. \
If the code is clean (Typy included), say so. If there are errors or suggestions, state \
them clearly, pointing at line numbers where possible, and propose corrections. \
The HTML must be a complete document (with <html>, <body>, etc.) and use inline CSS styles \
so it renders well in every mail client. Use a pleasant color palette (for example blue, \
green, light gray).";

/// Whether a changed file should be excerpted into the prompt.
fn is_eligible(path: &str) -> bool {
    !path.starts_with(CI_CONFIG_PREFIX)
        && !BINARY_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Labeled excerpt block for one file, capped at the first
/// [`MAX_EXCERPT_LINES`] lines. A read failure yields a placeholder
/// block naming the path and the error.
fn file_excerpt(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let mut excerpt = String::new();
            for line in content.lines().take(MAX_EXCERPT_LINES) {
                excerpt.push_str(line);
                excerpt.push('\n');
            }
            format!("--- Content of file: {path} ---\n{excerpt}\n")
        }
        Err(e) => format!("--- Unable to read file: {path} (error: {e}) ---\n"),
    }
}

/// Assemble the full review prompt from the changed-file list and the
/// verifier report. The report section is included only when the report
/// is non-empty.
pub fn build_review_prompt(changed_files: &[String], report: &str) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str("\n\n");

    if !report.is_empty() {
        // write! into a String cannot fail
        let _ = write!(
            prompt,
            "--- Typy Verification Report ---\n{report}\n------------------------------------\n\n"
        );
    }

    prompt.push_str("--- Modified Files ---\n");
    for path in changed_files {
        if !is_eligible(path) {
            continue;
        }
        prompt.push_str(&file_excerpt(path));
    }

    prompt
}
