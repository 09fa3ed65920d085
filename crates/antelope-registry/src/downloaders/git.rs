//! `git` downloader — clone or pull into a stable cache folder, then read
//! the module's own manifest. Shells out to the system `git` binary, the
//! same approach the rest of this codebase's VCS handling takes rather than
//! embedding a Git implementation.

use antelope_cache::ModuleCache;
use antelope_core::{Error, ModuleId, ModuleManifest, ModuleSource, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

pub fn fetch(
    cache: &ModuleCache,
    id: &ModuleId,
    remote: &str,
    branch: Option<&str>,
    commit: Option<&str>,
    source: ModuleSource,
) -> Result<Vec<ModuleManifest>> {
    let folder = cache.get_folder(id, false)?;

    if folder.join(".git").is_dir() {
        pull(id, &folder)?;
    } else {
        clone(id, remote, branch, &folder)?;
    }

    if let Some(commit) = commit {
        checkout(id, &folder, commit)?;
    } else if let Some(branch) = branch {
        checkout(id, &folder, branch)?;
    }

    Ok(vec![crate::manifest_file::read(id, &folder, source)?])
}

fn clone(id: &ModuleId, remote: &str, branch: Option<&str>, dest: &Path) -> Result<()> {
    info!(module = %id, remote, "cloning git source");
    let mut cmd = Command::new("git");
    cmd.arg("clone").arg("--quiet");
    if let Some(branch) = branch {
        cmd.arg("--branch").arg(branch);
    }
    cmd.arg(remote).arg(dest);
    run(id, cmd)
}

fn pull(id: &ModuleId, repo: &Path) -> Result<()> {
    debug!(module = %id, path = %repo.display(), "pulling git source");
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo).arg("pull").arg("--quiet");
    run(id, cmd)
}

fn checkout(id: &ModuleId, repo: &Path, reference: &str) -> Result<()> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo).arg("checkout").arg("--quiet").arg(reference);
    run(id, cmd)
}

fn run(id: &ModuleId, mut cmd: Command) -> Result<()> {
    let output = cmd.output().map_err(|e| Error::SourceFetchError {
        module: id.clone(),
        reason: format!("failed to invoke git: {e}"),
    })?;
    if !output.status.success() {
        return Err(Error::SourceFetchError {
            module: id.clone(),
            reason: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}
