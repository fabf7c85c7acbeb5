//! CLI entry point for hexo-writer

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hexo_writer::commands::{self, check::Check, post::PostEdit, tools::SiteStep};
use hexo_writer::repository::{ListQuery, NewPage, NewPost};
use hexo_writer::Blog;

#[derive(Parser)]
#[command(name = "hexo-writer")]
#[command(author = "Yukang Chen")]
#[command(version = "0.1.0")]
#[command(about = "Write and maintain the sources of a Hexo blog", long_about = None)]
struct Cli {
    /// Set the blog directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Tags, comma separated
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Categories, comma separated
        #[arg(short = 'C', long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Layout to use (defaults to `default_layout` from the config)
        #[arg(short, long)]
        layout: Option<String>,

        /// Create as a draft
        #[arg(long)]
        draft: bool,
    },

    /// List posts, newest first
    #[command(alias = "ls")]
    List {
        /// Show at most this many posts
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Show every post
        #[arg(short, long, conflicts_with = "limit")]
        all: bool,

        /// Only posts in this category
        #[arg(long)]
        category: Option<String>,

        /// Only posts with this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Search posts for a keyword
    Search { keyword: String },

    /// Show one post
    Show { filename: String },

    /// Replace parts of a post
    Update {
        filename: String,

        #[arg(long)]
        title: Option<String>,

        /// `YYYY-MM-DD HH:MM:SS`
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        layout: Option<String>,

        /// Tags, comma separated (an empty value clears them)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Categories, comma separated (an empty value clears them)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// New body text
        #[arg(long)]
        content: Option<String>,

        /// Read the new body from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete a post
    Delete { filename: String },

    /// Manage pages
    Page {
        #[command(subcommand)]
        command: PageCommands,
    },

    /// Check posts and pages
    Check {
        #[command(subcommand)]
        command: CheckCommands,

        /// Re-run whenever the sources change
        #[arg(short, long, global = true)]
        watch: bool,
    },

    /// Back up posts, config and themes
    Backup {
        /// Backup directory (defaults to blog_backup_<timestamp>)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Run the site builder
    Site {
        #[command(subcommand)]
        command: SiteCommands,
    },

    /// Git operations on the blog repository
    Git {
        #[command(subcommand)]
        command: GitCommands,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
enum PageCommands {
    /// Create a new page
    New {
        title: String,

        #[arg(short, long, default_value = "page")]
        layout: String,
    },

    /// List pages
    List,

    /// Show one page
    Show { slug: String },

    /// Replace parts of a page
    Update {
        slug: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        layout: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete a page and its directory
    Delete { slug: String },
}

#[derive(Subcommand)]
enum CheckCommands {
    /// Report missing or broken front matter
    Validate,
    /// Report broken links and missing images
    Links,
    /// Show blog statistics
    Stats,
}

#[derive(Subcommand)]
enum SiteCommands {
    /// Clean the public folder and cache
    Clean,

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Clean first
        #[arg(long)]
        clean: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Serve {
        #[arg(short, long, default_value = "4000")]
        port: u16,
    },

    /// Deploy the site
    Deploy,
}

#[derive(Subcommand)]
enum GitCommands {
    /// Show working tree status
    Status,

    /// Stage everything and commit
    Commit {
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Push to the configured remote
    Push,

    /// Pull from the configured remote
    Pull,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "hexo_writer=debug,info"
    } else {
        "hexo_writer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Version = cli.command {
        println!("hexo-writer version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Everything else works on an existing blog
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let blog = Blog::open(&base_dir)?;
    let json = cli.json;

    match cli.command {
        Commands::New {
            title,
            tags,
            categories,
            layout,
            draft,
        } => {
            let mut new = NewPost::new(title);
            new.tags = tags;
            new.categories = categories;
            new.layout = layout.unwrap_or_else(|| blog.config.default_layout.clone());
            new.draft = draft;
            commands::post::create(&blog, new)?;
        }

        Commands::List {
            limit,
            all,
            category,
            tag,
        } => {
            let query = ListQuery {
                limit: if all { None } else { Some(limit) },
                category,
                tag,
            };
            commands::post::list(&blog, &query, json)?;
        }

        Commands::Search { keyword } => commands::post::search(&blog, &keyword, json)?,

        Commands::Show { filename } => commands::post::show(&blog, &filename, json)?,

        Commands::Update {
            filename,
            title,
            date,
            layout,
            tags,
            categories,
            content,
            file,
        } => {
            let edit = PostEdit {
                title,
                date,
                layout,
                tags: tags.map(drop_empty),
                categories: categories.map(drop_empty),
                content: commands::read_content(content, file.as_deref())?,
            };
            commands::post::update(&blog, &filename, edit)?;
        }

        Commands::Delete { filename } => commands::post::delete(&blog, &filename)?,

        Commands::Page { command } => match command {
            PageCommands::New { title, layout } => {
                let mut new = NewPage::new(title);
                new.layout = layout;
                commands::page::create(&blog, new)?;
            }
            PageCommands::List => commands::page::list(&blog, json)?,
            PageCommands::Show { slug } => commands::page::show(&blog, &slug, json)?,
            PageCommands::Update {
                slug,
                title,
                layout,
                content,
                file,
            } => {
                let content = commands::read_content(content, file.as_deref())?;
                commands::page::update(&blog, &slug, title, layout, content)?;
            }
            PageCommands::Delete { slug } => commands::page::delete(&blog, &slug)?,
        },

        Commands::Check { command, watch } => {
            let check = match command {
                CheckCommands::Validate => Check::Validate,
                CheckCommands::Links => Check::Links,
                CheckCommands::Stats => Check::Stats,
            };
            if watch {
                commands::check::watch(&blog, check, json)?;
            } else {
                commands::check::run(&blog, check, json)?;
            }
        }

        Commands::Backup { dir } => {
            let target = blog.backup(dir.as_deref())?;
            println!("Backup complete: {}", target.display());
        }

        Commands::Site { command } => {
            let step = match command {
                SiteCommands::Clean => SiteStep::Clean,
                SiteCommands::Generate { clean } => SiteStep::Generate { clean },
                SiteCommands::Serve { port } => SiteStep::Serve { port },
                SiteCommands::Deploy => SiteStep::Deploy,
            };
            commands::tools::site(&blog, step)?;
        }

        Commands::Git { command } => match command {
            GitCommands::Status => commands::tools::git_status(&blog, json)?,
            GitCommands::Commit { message } => {
                commands::tools::git_commit(&blog, message.as_deref())?
            }
            GitCommands::Push => commands::tools::git_push(&blog)?,
            GitCommands::Pull => commands::tools::git_pull(&blog)?,
        },

        Commands::Version => {}
    }

    Ok(())
}

/// `--tags ""` parses as one empty item
fn drop_empty(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
