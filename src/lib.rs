//! hexo-writer: authoring tools for Hexo blogs
//!
//! This crate manages the Markdown sources of a Hexo site: creating,
//! listing, searching, updating and deleting posts and pages, checking the
//! corpus for broken metadata and links, and driving the `hexo` and `git`
//! command line tools.

pub mod checks;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod external;
pub mod helpers;
pub mod repository;

use std::path::{Path, PathBuf};

pub use error::{Result, WriterError};

use checks::{BlogStats, LinkChecker, LinkIssue, ValidationReport};
use config::WriterConfig;
use external::{GitCli, HexoCli};
use helpers::Clock;
use repository::{PageRepository, PostRepository, RecordLocks};

/// One blog on disk and everything needed to work on it
#[derive(Debug, Clone)]
pub struct Blog {
    /// Writer configuration
    pub config: WriterConfig,
    /// Blog root (where `_config.yml` lives)
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Posts directory
    pub posts_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    clock: Clock,
    locks: RecordLocks,
}

impl Blog {
    /// Open the blog rooted at `base_dir`, reading `_config.yml` if present
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            WriterConfig::load(&config_path)?
        } else {
            WriterConfig::default()
        };

        Self::with_config(base_dir, config)
    }

    /// Open with an already loaded configuration
    pub fn with_config(base_dir: impl Into<PathBuf>, config: WriterConfig) -> Result<Self> {
        let base_dir = base_dir.into();
        let source_dir = base_dir.join(&config.source_dir);
        let posts_dir = source_dir.join(&config.posts_dir);
        let public_dir = base_dir.join(&config.public_dir);

        if !posts_dir.is_dir() {
            return Err(WriterError::NotFound(posts_dir));
        }

        let clock = Clock::from_timezone(&config.timezone).map_err(WriterError::Config)?;

        tracing::debug!("Opened blog at {:?}", base_dir);
        Ok(Self {
            config,
            base_dir,
            source_dir,
            posts_dir,
            public_dir,
            clock,
            locks: RecordLocks::new(),
        })
    }

    /// Replace the clock new records are stamped with
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn posts(&self) -> PostRepository {
        PostRepository::new(
            self.posts_dir.clone(),
            self.clock,
            self.config.slug_style,
            self.locks.clone(),
        )
    }

    pub fn pages(&self) -> PageRepository {
        PageRepository::new(
            self.source_dir.clone(),
            self.clock,
            self.config.slug_style,
            self.locks.clone(),
        )
    }

    pub fn validate(&self) -> Result<ValidationReport> {
        checks::validate(&self.posts(), &self.pages())
    }

    pub fn check_links(&self) -> Result<Vec<LinkIssue>> {
        LinkChecker::new(&self.base_dir).check_posts(&self.posts())
    }

    pub fn stats(&self) -> Result<BlogStats> {
        checks::collect_stats(&self.posts(), &self.pages())
    }

    /// The site builder, run from the blog root
    pub fn site(&self) -> Result<HexoCli> {
        HexoCli::new(&self.config.site_command, &self.base_dir)
    }

    /// The git repository containing the blog
    pub fn git(&self) -> Result<GitCli> {
        GitCli::discover(&self.base_dir, self.config.git_remote.clone())
    }

    /// See [`commands::backup::run`]
    pub fn backup(&self, target: Option<&Path>) -> Result<PathBuf> {
        commands::backup::run(self, target)
    }
}
