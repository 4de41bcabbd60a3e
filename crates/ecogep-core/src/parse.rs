//! Extraction of the valuation JSON from free-text model replies

use serde_json::Value;

use crate::error::{GepError, Result};
use crate::models::ValuationReport;

/// Remove Markdown code-fence markers the model wraps around its JSON
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a model reply into a report.
///
/// Only text that cannot be read as a JSON object is an error; missing or
/// oddly typed fields inside the object are resolved by
/// [`ValuationReport::from_value`].
pub fn parse_reply(text: &str) -> Result<ValuationReport> {
    let cleaned = strip_code_fences(text);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => value,
        Err(first_err) => {
            let candidate = outermost_object(&cleaned).ok_or_else(|| {
                GepError::malformed(format!("reply is not JSON: {}", first_err), text)
            })?;
            tracing::debug!("Reply had text around the JSON object, retrying on the braced span");
            serde_json::from_str::<Value>(candidate).map_err(|e| {
                GepError::malformed(format!("reply is not JSON: {}", e), text)
            })?
        }
    };

    if !value.is_object() {
        return Err(GepError::malformed("expected a JSON object at the top level", text));
    }

    Ok(ValuationReport::from_value(value))
}

/// The span from the first `{` to the last `}`, if any
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
