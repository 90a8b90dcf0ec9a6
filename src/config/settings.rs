// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::constants::*;
use crate::agent::AgentSettings;
use crate::tools::types::ToolContext;

/// `[provider]` - the chat-completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// `[agent]` - orchestration loop limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_turns: usize,
    /// Start sessions with mutating tools auto-approved
    pub trust_mode: bool,
    pub compaction_threshold: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            trust_mode: false,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        }
    }
}

/// `[tools]` - per-tool limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub bash_timeout_secs: u64,
    pub max_output_chars: usize,
    pub glob_limit: usize,
    pub grep_limit: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bash_timeout_secs: DEFAULT_BASH_TIMEOUT_SECS,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            glob_limit: DEFAULT_GLOB_LIMIT,
            grep_limit: DEFAULT_GREP_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub agent: AgentConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> Result<()> {
        match self.provider.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => bail!(
                "No DeepSeek API key configured.\n\n\
                 Get a key from https://platform.deepseek.com/ and either:\n  \
                 export DEEPSEEK_API_KEY=\"sk-...\"\n\
                 or add it to ~/{}/{}:\n  \
                 [provider]\n  \
                 api_key = \"sk-...\"",
                CONFIG_DIR,
                CONFIG_FILE
            ),
        }

        if self.provider.base_url.trim().is_empty() {
            bail!("provider.base_url must not be empty");
        }

        if self.agent.max_turns == 0 {
            bail!("agent.max_turns must be greater than 0");
        }

        if self.tools.bash_timeout_secs == 0 {
            bail!("tools.bash_timeout_secs must be greater than 0");
        }

        if self.tools.bash_timeout_secs > MAX_BASH_TIMEOUT_SECS {
            bail!(
                "tools.bash_timeout_secs ({}) exceeds the maximum of {} seconds",
                self.tools.bash_timeout_secs,
                MAX_BASH_TIMEOUT_SECS
            );
        }

        if self.tools.glob_limit == 0 || self.tools.grep_limit == 0 {
            bail!("tools.glob_limit and tools.grep_limit must be greater than 0");
        }

        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.provider.api_key.as_deref()
    }

    /// Tool limits rooted at `working_dir`
    pub fn tool_context(&self, working_dir: &Path) -> ToolContext {
        let mut context = ToolContext::new(working_dir)
            .with_bash_timeout(Duration::from_secs(self.tools.bash_timeout_secs))
            .with_max_output_chars(self.tools.max_output_chars);
        context.glob_limit = self.tools.glob_limit;
        context.grep_limit = self.tools.grep_limit;
        context
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            max_turns: self.agent.max_turns,
            model: self.provider.model.clone(),
            max_tokens: self.provider.max_tokens,
            temperature: Some(self.provider.temperature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> Config {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-test".into());
        config
    }

    #[test]
    fn test_defaults_match_constants() {
        let config = Config::default();
        assert_eq!(config.provider.model, "deepseek-chat");
        assert_eq!(config.provider.base_url, "https://api.deepseek.com");
        assert_eq!(config.agent.max_turns, 50);
        assert_eq!(config.tools.bash_timeout_secs, 120);
        assert_eq!(config.tools.glob_limit, 100);
        assert_eq!(config.tools.grep_limit, 50);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));

        let mut blank = Config::default();
        blank.provider.api_key = Some("   ".into());
        assert!(blank.validate().is_err());

        assert!(with_key().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = with_key();
        config.agent.max_turns = 0;
        assert!(config.validate().unwrap_err().to_string().contains("max_turns"));

        let mut config = with_key();
        config.tools.bash_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = with_key();
        config.tools.bash_timeout_secs = 601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tool_context_carries_limits() {
        let mut config = with_key();
        config.tools.bash_timeout_secs = 30;
        config.tools.grep_limit = 7;
        let ctx = config.tool_context(Path::new("/work"));
        assert_eq!(ctx.bash_timeout, Duration::from_secs(30));
        assert_eq!(ctx.grep_limit, 7);
        assert_eq!(ctx.working_dir, Path::new("/work"));
    }

    #[test]
    fn test_agent_settings_from_config() {
        let mut config = with_key();
        config.provider.model = "deepseek-coder".into();
        config.agent.max_turns = 3;
        let settings = config.agent_settings();
        assert_eq!(settings.max_turns, 3);
        assert_eq!(settings.model, "deepseek-coder");
        assert_eq!(settings.temperature, Some(0.0));
    }
}
