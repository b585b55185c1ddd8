//! Stage 4's optional micro-prompt assist. Disabled unless a
//! provider is installed; the resolver never constructs one itself.

use browserlet_protocol::ScoredCandidate;

/// A compact judge presented with an intent and a handful of candidates,
/// asked to choose one. Implementations back this with an LLM call or, in
/// tests, a fixed answer.
pub trait MicroPromptProvider: Send + Sync {
    /// Choose a candidate by index into `candidates` (already limited to the
    /// top 5), or `None` if undecided.
    fn choose(&self, intent: &str, candidates: &[ScoredCandidate]) -> Option<usize>;
}
