/// Resource limits that bound the work a single sentence set may ask for
///
/// The defaults are generous for hand-written definitions while still
/// rejecting runaway inputs before evaluation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum number of sentences in one set
    pub max_sentences: usize,

    /// Maximum depth of the dependency chain followed while resolving one sentence
    pub max_resolution_depth: usize,

    /// Maximum length in bytes of a single path or query expression
    pub max_expression_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_sentences: 10_000,
            max_resolution_depth: 1_000,
            max_expression_bytes: 4 * 1024, // 4 KB
        }
    }
}

impl ResourceLimits {
    /// Create a new ResourceLimits with default values
    pub fn new() -> Self {
        Self::default()
    }
}
