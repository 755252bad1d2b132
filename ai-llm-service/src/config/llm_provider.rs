//! Supported LLM backends.

use std::fmt;
use std::str::FromStr;

use crate::error_handler::AiLlmError;

/// Which backend serves summary generation.
///
/// `Fake` is a debugging backend that answers instantly with canned text;
/// it keeps full pipeline runs cheap and deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    OpenAi,
    DeepSeek,
    Ollama,
    Fake,
}

impl FromStr for LlmProvider {
    type Err = AiLlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "deepseek" => Ok(Self::DeepSeek),
            "ollama" => Ok(Self::Ollama),
            "fake" => Ok(Self::Fake),
            other => Err(AiLlmError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Ollama => "ollama",
            Self::Fake => "fake",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("DeepSeek".parse::<LlmProvider>().unwrap(), LlmProvider::DeepSeek);
        assert_eq!("OLLAMA".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!("fake".parse::<LlmProvider>().unwrap(), LlmProvider::Fake);
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!("claude".parse::<LlmProvider>().is_err());
    }
}
