//! Token counting and context chunking.
//!
//! Everything sent to the LLM is budgeted against its context window using
//! the model's byte-pair encoding. Text that looks like a control token
//! (`<|...|>`) is defused before encoding so user code can never smuggle
//! special tokens into a prompt.

use std::sync::LazyLock;

use regex::Regex;
use tiktoken_rs::{CoreBPE, cl100k_base};

use crate::errors::SummaryError;

static SPECIAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|([^|]+?)\|>").expect("static pattern"));

/// `<|im_start|>` becomes `< |im_start| >`: same content, no longer a
/// control token for any encoder.
fn sanitize_special_tokens(text: &str) -> String {
    SPECIAL_TOKEN.replace_all(text, "< |$1| >").into_owned()
}

/// Token budgeter for one context-window size.
///
/// Iterative chunking targets half the window per chunk, with a 10%
/// overlap between adjacent chunks so no statement loses its context at a
/// boundary.
pub struct TokenBudget {
    bpe: CoreBPE,
    max_context: usize,
    chunk_size: usize,
    overlap: usize,
}

impl TokenBudget {
    /// Builds a budgeter over the `cl100k_base` encoding.
    pub fn new(max_context: usize) -> Result<Self, SummaryError> {
        let bpe = cl100k_base().map_err(|e| SummaryError::Tokenizer(e.to_string()))?;
        let chunk_size = max_context / 2;
        let overlap = chunk_size / 10;
        Ok(Self { bpe, max_context, chunk_size, overlap })
    }

    /// The configured context-window size.
    pub fn max_context(&self) -> usize {
        self.max_context
    }

    /// Chunk size used by iterative summarization.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        let safe = sanitize_special_tokens(text);
        self.bpe.encode_ordinary(&safe).len()
    }

    /// Splits one large text into overlapping chunks of `chunk_size`
    /// tokens with stride `chunk_size − overlap`. A trailing remainder
    /// shorter than half a chunk is merged into the previous chunk rather
    /// than emitted on its own.
    pub fn chunk_text(&self, text: &str) -> Result<Vec<String>, SummaryError> {
        let safe = sanitize_special_tokens(text);
        let tokens = self.bpe.encode_ordinary(&safe);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.chunk_size;
        let stride = chunk_size - self.overlap;
        let mut chunks: Vec<Vec<_>> = Vec::new();
        let mut i = 0;

        loop {
            if i + chunk_size >= tokens.len() {
                chunks.push(tokens[i..].to_vec());
                break;
            }

            chunks.push(tokens[i..i + chunk_size].to_vec());
            i += stride;

            if i + chunk_size >= tokens.len() && tokens.len() - i < chunk_size / 2 {
                let last = chunks.len() - 1;
                chunks[last] = tokens[i - stride..].to_vec();
                break;
            }
        }

        chunks
            .into_iter()
            .map(|chunk| {
                self.bpe
                    .decode(chunk)
                    .map_err(|e| SummaryError::Tokenizer(e.to_string()))
            })
            .collect()
    }

    /// Packs a list of summaries into as few `"; "`-joined chunks as
    /// possible without exceeding `chunk_size` and without ever splitting
    /// an individual summary; an oversize summary becomes its own chunk.
    pub fn chunk_summaries(&self, summaries: &[String]) -> Vec<String> {
        if summaries.is_empty() {
            return Vec::new();
        }

        let separator = "; ";
        let separator_cost = self.count(separator);
        let chunk_size = self.chunk_size;

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0usize;

        for summary in summaries {
            let tokens = self.count(summary);

            if tokens > chunk_size {
                if !current.is_empty() {
                    chunks.push(current.join(separator));
                    current.clear();
                    current_tokens = 0;
                }
                chunks.push(summary.clone());
                continue;
            }

            let cost = if current.is_empty() { tokens } else { tokens + separator_cost };
            if current_tokens + cost > chunk_size {
                chunks.push(current.join(separator));
                current = vec![summary];
                current_tokens = tokens;
            } else {
                current.push(summary);
                current_tokens += cost;
            }
        }

        if !current.is_empty() {
            chunks.push(current.join(separator));
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(max_context: usize) -> TokenBudget {
        TokenBudget::new(max_context).unwrap()
    }

    #[test]
    fn defuses_control_tokens() {
        assert_eq!(
            sanitize_special_tokens("a <|im_start|> b <|endoftext|>"),
            "a < |im_start| > b < |endoftext| >"
        );
        assert_eq!(sanitize_special_tokens("no specials"), "no specials");
    }

    #[test]
    fn counts_tokens() {
        let b = budget(8192);
        assert_eq!(b.count(""), 0);
        assert!(b.count("hello world") >= 2);
    }

    #[test]
    fn short_text_is_one_chunk() {
        let b = budget(256);
        let chunks = b.chunk_text("fn main() { println!(\"hi\"); }").unwrap();
        assert_eq!(chunks.len(), 1);
    }

    // Chunks respect the size budget (the merged tail may run at most half
    // a chunk over) and jointly cover at least the whole input.
    #[test]
    fn long_text_chunks_respect_budget() {
        let b = budget(128);
        let text = "let value = compute(input); ".repeat(200);
        let chunks = b.chunk_text(&text).unwrap();
        assert!(chunks.len() > 1);

        let chunk_size = b.chunk_size();
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(b.count(chunk) <= chunk_size);
        }
        assert!(b.count(chunks.last().unwrap()) <= chunk_size + chunk_size / 2);

        // Overlap means the chunk totals exceed the raw count, by roughly
        // one overlap per boundary.
        let total: usize = chunks.iter().map(|c| b.count(c)).sum();
        let raw = b.count(&text);
        assert!(total >= raw);
        assert!(total <= raw + (chunks.len() - 1) * (chunk_size / 10) + chunks.len());
    }

    #[test]
    fn summaries_pack_greedily() {
        let b = budget(64); // chunk budget of 32 tokens
        let summaries: Vec<String> = (0..6)
            .map(|i| format!("component {i} handles one concern"))
            .collect();
        let chunks = b.chunk_summaries(&summaries);

        assert!(chunks.len() > 1, "six summaries cannot fit one 32-token chunk");
        for chunk in &chunks {
            assert!(b.count(chunk) <= b.chunk_size());
        }
        // Every summary survives, in order, unsplit.
        let joined = chunks.join("; ");
        for summary in &summaries {
            assert!(joined.contains(summary.as_str()));
        }
    }

    #[test]
    fn oversize_summary_gets_its_own_chunk() {
        let b = budget(64);
        let huge = "word ".repeat(100);
        let summaries = vec!["small one".to_string(), huge.clone(), "small two".to_string()];
        let chunks = b.chunk_summaries(&summaries);

        assert!(chunks.iter().any(|c| c.trim() == huge.trim()));
    }

    #[test]
    fn empty_inputs() {
        let b = budget(64);
        assert!(b.chunk_text("").unwrap().is_empty());
        assert!(b.chunk_summaries(&[]).is_empty());
    }
}
