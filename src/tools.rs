//! Finding the external minifiers on disk.

use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

/// Folder names npm-style package managers install project-local binaries under.
const LOCAL_TOOL_DIRS: [&str; 2] = ["node_modules", "node_libraries"];

/// Locates a named executable.
///
/// The process search path is tried first. After that every
/// `node_modules/.bin` and `node_libraries/.bin` directory found walking upward
/// from the current directory and from the running executable's directory.
/// Windows executable extensions are handled by `which`.
pub fn locate(name: &str) -> Option<PathBuf> {
	if let Ok(path) = which::which(name) {
		return Some(path);
	}
	let cwd = env::current_dir().ok()?;
	local_tool_dirs(&start_points(&cwd))
		.into_iter()
		.filter(|dir| dir.is_dir())
		.find_map(|dir| which::which_in(name, Some(&dir), &cwd).ok())
}

/// True when [`locate`] finds the tool.
pub fn exists(name: &str) -> bool {
	locate(name).is_some()
}

fn start_points(cwd: &Path) -> Vec<PathBuf> {
	let mut starts = vec![cwd.canonicalize().unwrap_or_else(|_| cwd.to_owned())];
	if let Some(exe_dir) = env::current_exe()
		.ok()
		.and_then(|exe| exe.canonicalize().ok())
		.and_then(|exe| exe.parent().map(Path::to_owned))
	{
		starts.push(exe_dir);
	}
	starts
}

/// Every `<ancestor>/<tool dir>/.bin` above the given start points, nearest first.
fn local_tool_dirs(starts: &[PathBuf]) -> Vec<PathBuf> {
	let mut seen = BTreeSet::new();
	let mut dirs = Vec::new();
	for start in starts {
		for ancestor in start.ancestors() {
			for folder in LOCAL_TOOL_DIRS.iter() {
				let dir = ancestor.join(folder).join(".bin");
				if seen.insert(dir.clone()) {
					dirs.push(dir);
				}
			}
		}
	}
	dirs
}
