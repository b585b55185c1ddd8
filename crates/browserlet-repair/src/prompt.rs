//! The shared prompt text both bundled providers send to their model; kept
//! in one place so `claude` and `ollama` ask the same question.

use crate::provider::RepairRequest;

/// Render `request` into the instruction both providers send.
pub(crate) fn build(request: &RepairRequest) -> String {
    format!(
        "A browser-automation step failed to find its target element.\n\
         Step id: {}\nIntent: {}\nAction: {:?}\nPage URL: {}\n\
         Hint types that matched something: {:?}\n\
         Hint types that matched nothing: {:?}\n\
         Nearby HTML:\n{}\n\n\
         Suggest replacement hints as a JSON object with keys \
         `suggested_hints` (array of {{type, value}}), `confidence` \
         (0-1), and `reasoning` (short string). Respond with JSON only.",
        request.step_id,
        request.intent,
        request.action,
        request.page_url,
        request.matched,
        request.failed,
        request.dom_excerpt,
    )
}
