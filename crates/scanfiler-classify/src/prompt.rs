//! Classification instruction
//!
//! The instruction lists the closed taxonomy and shows one example answer.
//! It is sent as the first user message, followed by the OCR text.

use scanfiler_core::config::Category;

/// Builds the classification instruction for `categories`
pub fn build_prompt(categories: &[Category]) -> String {
    let mut prompt = String::from(
        "You will be provided with the OCR version of a scanned document, and your \
task is to classify its content as one of the following categories. Give an \
explanation, a title, a filename, and a category in JSON format.\n\n\
An example response would be:\n\
{\"category\": \"health\", \"explanation\": \"This is a scan of a letter by the \
health insurance, issuing an SMS-TAN reset code\", \"title\": \"SMS-TAN \
Wiederherstellungscode\", \"filename\": \"sms_tan_reset_code.pdf\"}\n\n",
    );

    for category in categories {
        prompt.push_str(&format!("- {}: {}\n", category.name, category.description));
    }

    prompt.push_str(
        "\nIf you feel that the document does not fit any of the above categories \
but fits well in a broader category, you may suggest one (only in one word). \
Only do so as a last resort.\n",
    );
    prompt
}

/// Removes a surrounding Markdown code fence from a model answer
///
/// Accepts "```json ... ```" and plain "``` ... ```"; other text is returned
/// trimmed.
pub fn strip_code_fences(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
