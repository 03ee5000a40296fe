mod anthropic;
mod claude_cli;
mod ollama;

pub use anthropic::AnthropicHttpBackend;
pub use claude_cli::ClaudeCliBackend;
pub use ollama::OllamaBackend;
