use crate::error::GenerateError;

/// Result of one successful generation, scoped to a single request.
///
/// Token counts are measured in the executor's own units against this
/// member's text only: `input_tokens` re-encodes the raw submitted input and
/// `output_tokens` re-encodes the full decoded output, never a batch
/// aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Full decoded model output, prompt echo included. Boundaries strip it
    /// with [`PromptTemplate::extract_response`].
    ///
    /// [`PromptTemplate::extract_response`]: crate::PromptTemplate::extract_response
    pub text: String,

    /// Token length of this member's submitted input text.
    pub input_tokens: usize,

    /// Token length of this member's full decoded output.
    pub output_tokens: usize,
}

/// What a completion gate delivers: exactly one of these per request.
pub type Outcome = Result<Generation, GenerateError>;
