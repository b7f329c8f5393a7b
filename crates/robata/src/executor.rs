//! The seam between the batching core and the model runtime.
//!
//! The core never touches tensors or model weights. It talks to the model
//! through [`ModelExecutor`], an opaque capability that encodes text into
//! the executor's own token units, generates a batch, and decodes token
//! sequences back into text. Loading, quantization and adapter handling all
//! live behind implementations of this trait.

use async_trait::async_trait;

/// Sampling options forwarded to the executor with each generate call.
///
/// The core does not interpret these; they are plumbing for whatever
/// decoding strategy the executor implements.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub use_cache: bool,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            use_cache: true,
        }
    }
}

/// Opaque model capability consumed by the batch scheduler.
///
/// `generate` receives every member of a batch at once and must return one
/// output row per input row, in order. It may block for an arbitrarily long
/// time and may fail; the scheduler wraps it in a hard timeout and fans any
/// failure out to the whole batch.
///
/// The scheduler is the only caller and invokes `generate` from a single
/// task, so implementations do not need to be safe for concurrent
/// generation.
#[async_trait]
pub trait ModelExecutor: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Encodes text into the executor's token units.
    fn encode(&self, text: &str) -> Result<Vec<u32>, Self::Error>;

    /// Runs generation for a whole batch. One output row per input row.
    async fn generate(
        &self,
        batch: Vec<Vec<u32>>,
        max_new_tokens: usize,
        sampling: &SamplingOptions,
    ) -> Result<Vec<Vec<u32>>, Self::Error>;

    /// Decodes one token sequence back into text.
    fn decode(&self, tokens: &[u32]) -> Result<String, Self::Error>;

    /// Releases transient per-batch resources (accelerator cache and the
    /// like). Called after every cycle, on the failure path too.
    fn release(&self) {}
}

#[async_trait]
impl<E: ModelExecutor + ?Sized> ModelExecutor for std::sync::Arc<E> {
    type Error = E::Error;

    fn encode(&self, text: &str) -> Result<Vec<u32>, Self::Error> {
        (**self).encode(text)
    }

    async fn generate(
        &self,
        batch: Vec<Vec<u32>>,
        max_new_tokens: usize,
        sampling: &SamplingOptions,
    ) -> Result<Vec<Vec<u32>>, Self::Error> {
        (**self).generate(batch, max_new_tokens, sampling).await
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, Self::Error> {
        (**self).decode(tokens)
    }

    fn release(&self) {
        (**self).release()
    }
}

/// Marker preceding the response slot in the stock template. Decoded output
/// is split at the last occurrence of this marker to recover the generated
/// text.
const RESPONSE_MARKER: &str = "### Response:";

const ALPACA_TEMPLATE: &str = "Below is an instruction that describes a task, \
paired with an input that provides further context. Write a response that \
appropriately completes the request.

### Instruction:
{instruction}

### Input:
{input}

### Response:
{response}";

/// Three-slot prompt formatter.
///
/// A template is an opaque string with `{instruction}`, `{input}` and
/// `{response}` slots. The scheduler formats every batch member through it
/// before encoding; the serving boundary uses [`extract_response`] to strip
/// the prompt echo from decoded output.
///
/// [`extract_response`]: PromptTemplate::extract_response
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    response_marker: String,
}

impl PromptTemplate {
    /// The Alpaca instruction layout, which is what instruction-tuned
    /// checkpoints in this family expect.
    pub fn alpaca() -> Self {
        Self {
            template: ALPACA_TEMPLATE.to_string(),
            response_marker: RESPONSE_MARKER.to_string(),
        }
    }

    /// A custom template. `response_marker` must occur in `template` ahead
    /// of the `{response}` slot for [`extract_response`] to find the
    /// generated text.
    ///
    /// [`extract_response`]: PromptTemplate::extract_response
    pub fn new(template: impl Into<String>, response_marker: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            response_marker: response_marker.into(),
        }
    }

    /// Fills the three slots.
    pub fn format(&self, instruction: &str, input: &str, response: &str) -> String {
        self.template
            .replace("{instruction}", instruction)
            .replace("{input}", input)
            .replace("{response}", response)
    }

    /// Recovers the generated text from a decoded model output: everything
    /// after the last response marker, trimmed. Output that carries no
    /// marker is returned whole, trimmed.
    pub fn extract_response<'a>(&self, decoded: &'a str) -> &'a str {
        decoded
            .rsplit(self.response_marker.as_str())
            .next()
            .unwrap_or(decoded)
            .trim()
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::alpaca()
    }
}
