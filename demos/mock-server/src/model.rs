use std::convert::Infallible;
use std::time::Duration;

use async_trait::async_trait;

use robata::{ModelExecutor, SamplingOptions};

/// Toy executor for exercising the serving stack without a real model.
///
/// Tokens are characters. Each generated row echoes its prompt and appends
/// a canned response slot, the way a causal decode would.
pub struct EchoModel {
    latency: Duration,
}

impl EchoModel {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(50),
        }
    }
}

#[async_trait]
impl ModelExecutor for EchoModel {
    type Error = Infallible;

    fn encode(&self, text: &str) -> Result<Vec<u32>, Infallible> {
        Ok(text.chars().map(|c| c as u32).collect())
    }

    async fn generate(
        &self,
        batch: Vec<Vec<u32>>,
        max_new_tokens: usize,
        _sampling: &SamplingOptions,
    ) -> Result<Vec<Vec<u32>>, Infallible> {
        // Pretend the accelerator is busy for a moment.
        tokio::time::sleep(self.latency).await;

        let reply: Vec<u32> = self
            .encode("Nothing on the grill yet, but the batch came through.")?
            .into_iter()
            .take(max_new_tokens)
            .collect();

        Ok(batch
            .into_iter()
            .map(|mut row| {
                row.extend_from_slice(&reply);
                row
            })
            .collect())
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, Infallible> {
        Ok(tokens.iter().filter_map(|&t| char::from_u32(t)).collect())
    }
}
