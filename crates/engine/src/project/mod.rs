//! Project callbacks the engine uses to reach the filesystem.
//!
//! The engine never touches the filesystem directly: it reads sources, lists directories and loads
//! project manifests through a [`ProjectHost`]. Only the manifest in the requested directory is
//! considered; walking up to find an enclosing project is left to the engine.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// File name of a project manifest.
pub const MANIFEST_FILE_NAME: &str = "qsharp.json";

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
	/// Regular file.
	File,
	/// Directory.
	Directory,
	/// Symlink or anything else.
	Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
	/// Entry file name (not a full path).
	pub name: String,
	/// Entry kind.
	pub kind: EntryKind,
}

/// A loaded project manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
	/// Directory containing the manifest.
	#[serde(skip)]
	pub manifest_dir: PathBuf,
	/// Optional author field.
	#[serde(default)]
	pub author: Option<String>,
	/// Optional license field.
	#[serde(default)]
	pub license: Option<String>,
	/// Lint overrides, passed through to the engine untouched.
	#[serde(default)]
	pub lints: Vec<serde_json::Value>,
	/// Explicit source file list, if the project pins one.
	#[serde(default)]
	pub files: Vec<String>,
}

/// File reader, directory lister and manifest loader handed to the engine.
#[async_trait]
pub trait ProjectHost: Send + Sync {
	/// Reads a source file as UTF-8 text.
	async fn read_file(&self, path: &Path) -> Result<String>;

	/// Lists a directory, sorted by entry name.
	async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>>;

	/// Loads the manifest located directly in `dir`, if any.
	async fn load_manifest(&self, dir: &Path) -> Result<Option<Manifest>>;
}

/// [`ProjectHost`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProjectHost;

impl FsProjectHost {
	/// Creates a filesystem project host.
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl ProjectHost for FsProjectHost {
	async fn read_file(&self, path: &Path) -> Result<String> {
		Ok(tokio::fs::read_to_string(path).await?)
	}

	async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
		let mut reader = tokio::fs::read_dir(path).await?;
		let mut entries = Vec::new();
		while let Some(entry) = reader.next_entry().await? {
			let file_type = entry.file_type().await?;
			let kind = if file_type.is_file() {
				EntryKind::File
			} else if file_type.is_dir() {
				EntryKind::Directory
			} else {
				EntryKind::Other
			};
			entries.push(DirEntry {
				name: entry.file_name().to_string_lossy().into_owned(),
				kind,
			});
		}
		entries.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(entries)
	}

	async fn load_manifest(&self, dir: &Path) -> Result<Option<Manifest>> {
		let path = dir.join(MANIFEST_FILE_NAME);
		let bytes = match tokio::fs::read(&path).await {
			Ok(bytes) => bytes,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(err.into()),
		};
		let mut manifest: Manifest = serde_json::from_slice(&bytes).map_err(|source| Error::Manifest { path: path.clone(), source })?;
		manifest.manifest_dir = dir.to_path_buf();
		tracing::debug!(path = %path.display(), "project.manifest.loaded");
		Ok(Some(manifest))
	}
}
