//! Copy the writable parts of a blog somewhere safe

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, WriterError};
use crate::Blog;

/// Written as `backup_info.json` next to the copied files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupInfo {
    /// Local time the backup was taken, ISO 8601
    pub backup_time: String,
    /// Every `.md` file in the posts directory, drafts included
    pub total_posts: usize,
    pub blog_path: PathBuf,
}

/// Back up posts, site config and themes.
///
/// Without a `target` a `blog_backup_<YYYYmmdd_HHMMSS>` directory is
/// created under the blog root. Returns the backup directory.
pub fn run(blog: &Blog, target: Option<&Path>) -> Result<PathBuf> {
    let now = blog.clock().now();
    let target = match target {
        Some(t) if t.is_absolute() => t.to_path_buf(),
        Some(t) => blog.base_dir.join(t),
        None => blog
            .base_dir
            .join(format!("blog_backup_{}", now.format("%Y%m%d_%H%M%S"))),
    };
    if target.starts_with(&blog.posts_dir) {
        return Err(WriterError::InvalidArgument(format!(
            "backup target {:?} is inside the posts directory",
            target
        )));
    }

    tracing::info!("Backing up {:?} to {:?}", blog.base_dir, target);
    fs::create_dir_all(&target).map_err(|e| WriterError::file(&target, e))?;

    copy_tree(&blog.posts_dir, &target.join("_posts"))?;

    for config in config_files(&blog.base_dir)? {
        if let Some(name) = config.file_name() {
            copy_file(&config, &target.join(name))?;
        }
    }

    let themes = blog.base_dir.join("themes");
    if themes.is_dir() {
        copy_tree(&themes, &target.join("themes"))?;
    }

    let info = BackupInfo {
        backup_time: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        total_posts: blog.posts().all_files()?.len(),
        blog_path: blog.base_dir.clone(),
    };
    let json = serde_json::to_string_pretty(&info)
        .map_err(|e| WriterError::InvalidArgument(format!("cannot encode backup info: {}", e)))?;
    let info_path = target.join("backup_info.json");
    fs::write(&info_path, json).map_err(|e| WriterError::file(&info_path, e))?;

    tracing::info!("Backup complete: {:?}", target);
    Ok(target)
}

/// `_config.yml`, theme overrides like `_config.next.yml`, and `package.json`
fn config_files(base_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/_config*.yml",
        glob::Pattern::escape(&base_dir.to_string_lossy()).trim_end_matches('/')
    );
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| WriterError::InvalidArgument(format!("bad blog path: {}", e)))?
        .filter_map(|entry| entry.ok())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name == "_config.yml" || name.starts_with("_config.")
        })
        .filter(|path| path.is_file())
        .collect();

    let package = base_dir.join("package.json");
    if package.is_file() {
        files.push(package);
    }
    files.sort();
    Ok(files)
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            match e.into_io_error() {
                Some(io) => WriterError::file(path, io),
                None => WriterError::InvalidArgument(format!("filesystem loop at {:?}", path)),
            }
        })?;

        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let dest = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| WriterError::file(&dest, e))?;
        } else {
            copy_file(entry.path(), &dest)?;
        }
    }
    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| WriterError::file(parent, e))?;
    }
    tracing::debug!("Copying {:?}", from);
    fs::copy(from, to).map_err(|e| WriterError::file(from, e))?;
    Ok(())
}
