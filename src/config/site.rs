//! Writer configuration (read from the blog's _config.yml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::content::SlugStyle;
use crate::error::{Result, WriterError};

/// Settings the writer needs from `_config.yml`.
///
/// The file belongs to the site builder, so everything else in it lands in
/// `extra` and is left alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    // Directory
    pub source_dir: String,
    /// Posts directory, relative to `source_dir`
    pub posts_dir: String,
    pub public_dir: String,

    // Writing
    pub default_layout: String,
    pub timezone: String,
    pub slug_style: SlugStyle,

    // External tools
    /// Program and leading arguments of the site builder
    pub site_command: Vec<String>,
    pub git_remote: String,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            source_dir: "source".to_string(),
            posts_dir: "_posts".to_string(),
            public_dir: "public".to_string(),

            default_layout: "post".to_string(),
            timezone: String::new(),
            slug_style: SlugStyle::Unicode,

            site_command: vec!["npx".to_string(), "hexo".to_string()],
            git_remote: "origin".to_string(),

            extra: HashMap::new(),
        }
    }
}

impl WriterConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| WriterError::from_io(path, e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: WriterConfig =
            serde_yaml::from_str(content).map_err(|e| WriterError::Config(e.to_string()))?;
        if config.site_command.is_empty() {
            return Err(WriterError::Config("site_command must not be empty".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WriterConfig::default();
        assert_eq!(config.source_dir, "source");
        assert_eq!(config.posts_dir, "_posts");
        assert_eq!(config.site_command, vec!["npx", "hexo"]);
        assert_eq!(config.slug_style, SlugStyle::Unicode);
    }

    #[test]
    fn test_parse_hexo_config() {
        let yaml = r#"
title: My Blog
author: Test User
source_dir: src
timezone: Asia/Shanghai
slug_style: ascii
theme: next
"#;
        let config = WriterConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.source_dir, "src");
        assert_eq!(config.timezone, "Asia/Shanghai");
        assert_eq!(config.slug_style, SlugStyle::Ascii);
        assert_eq!(config.default_layout, "post");
        assert!(config.extra.contains_key("theme"));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = WriterConfig::from_yaml("\n").unwrap();
        assert_eq!(config.public_dir, "public");
    }

    #[test]
    fn test_empty_site_command_rejected() {
        let err = WriterConfig::from_yaml("site_command: []\n").unwrap_err();
        assert!(matches!(err, WriterError::Config(_)));
    }
}
