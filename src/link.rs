use std::{
    ffi::OsStr,
    fs::{hard_link, remove_file},
    io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::FileId;

#[derive(Debug, thiserror::Error)]
#[error("Tag directory `{}` does not exist", .0.display())]
pub struct NoTagDirError(PathBuf);

#[derive(Debug, thiserror::Error)]
#[error("`{}` does not name a file", .0.display())]
pub struct InvalidFileError(PathBuf);

#[derive(Debug, thiserror::Error)]
#[error("`{}` already exists", .0.display())]
pub struct HasTagError(PathBuf);

#[derive(Debug, thiserror::Error)]
#[error("`{}` does not exist", .0.display())]
pub struct LacksTagError(PathBuf);

#[derive(Debug, thiserror::Error)]
#[error("`{}` is a different file than `{}`", .link.display(), .file.display())]
pub struct MismatchError {
    file: PathBuf,
    link: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub enum TagFileError {
    NoTagDir(#[from] NoTagDirError),
    InvalidFile(#[from] InvalidFileError),
    HasTag(#[from] HasTagError),
    Filesystem(#[from] io::Error),
}

impl TagFileError {
    /// Return whether the file could not be tagged
    /// because of the current state of the tag,
    /// rather than a problem with the file or filesystem.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::HasTag(_))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub enum UntagFileError {
    NoTagDir(#[from] NoTagDirError),
    InvalidFile(#[from] InvalidFileError),
    LacksTag(#[from] LacksTagError),
    Mismatch(#[from] MismatchError),
    Filesystem(#[from] io::Error),
}

impl UntagFileError {
    /// Return whether the file could not be untagged
    /// because of the current state of the tag,
    /// rather than a problem with the file or filesystem.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::LacksTag(_) | Self::Mismatch(_))
    }
}

/// Tag `file` with `dir`
/// by linking it into `dir` under the same name.
///
/// Returns the new link.
pub fn tag<P, Q>(file: P, dir: Q) -> Result<PathBuf, TagFileError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let file = file.as_ref();
    let link = dir.as_ref().join(file_name(file)?);
    ensure_tag_dir(dir.as_ref())?;

    // `link(2)` fails if the destination exists,
    // so there is no window for another process to create it.
    match hard_link(file, &link) {
        Ok(()) => {
            debug!("Linked `{}` to `{}`", link.display(), file.display());
            Ok(link)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(HasTagError(link).into()),
        Err(e) => Err(e.into()),
    }
}

/// Untag `file` from `dir`
/// by removing the link with the same name from `dir`.
///
/// The link must be the same file as `file`.
/// Returns the removed link.
pub fn untag<P, Q>(file: P, dir: Q) -> Result<PathBuf, UntagFileError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let file = file.as_ref();
    let link = dir.as_ref().join(file_name(file)?);
    ensure_tag_dir(dir.as_ref())?;

    let link_id = match FileId::of(&link) {
        Ok(id) => id,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LacksTagError(link).into()),
        Err(e) => return Err(e.into()),
    };
    if FileId::of(file)? != link_id {
        return Err(MismatchError {
            file: file.to_owned(),
            link,
        }
        .into());
    }

    remove_file(&link)?;
    debug!("Unlinked `{}`", link.display());
    Ok(link)
}

fn file_name(file: &Path) -> Result<&OsStr, InvalidFileError> {
    file.file_name()
        .ok_or_else(|| InvalidFileError(file.to_owned()))
}

fn ensure_tag_dir(dir: &Path) -> Result<(), NoTagDirError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(NoTagDirError(dir.to_owned()))
    }
}
