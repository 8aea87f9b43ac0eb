mod init;

use std::{
    fs::create_dir,
    io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    fs::absolute,
    link::{tag, untag, TagFileError, UntagFileError},
    list::{links, tags_in, tags_of},
    search::{search_with, SearchError},
    tag::{resolve_as_path, resolve_as_tag},
    Node, Tag, METADATA_DIR,
};

pub use self::init::{init_library, InitError};

/// Return whether `dir` is the root of a library.
pub fn is_library<P>(dir: P) -> bool
where
    P: AsRef<Path>,
{
    dir.as_ref().join(METADATA_DIR).is_dir()
}

/// Find the nearest library containing `start`.
///
/// `start` is made absolute and normalized first,
/// so an empty path starts from the working directory.
pub fn find_library<P>(start: P) -> io::Result<Option<PathBuf>>
where
    P: AsRef<Path>,
{
    Ok(absolute(start)?
        .ancestors()
        .find(|dir| is_library(dir))
        .map(|dir| dir.to_owned()))
}

pub fn find_library_from_current_dir() -> io::Result<Option<PathBuf>> {
    find_library("")
}

/// Path of a metadata resource of the library at `dir`.
pub fn resource_path<P, Q>(dir: P, relative: Q) -> PathBuf
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    dir.as_ref().join(METADATA_DIR).join(relative)
}

/// A library root,
/// resolving tags relative to itself.
#[derive(Debug, Clone)]
pub struct Library {
    path: PathBuf,
    metadata: PathBuf,
}

impl Library {
    pub fn new<P>(path: P) -> Option<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        let metadata = path.join(METADATA_DIR);
        if metadata.is_dir() {
            Some(Self { path, metadata })
        } else {
            None
        }
    }

    pub fn find<P>(start: P) -> io::Result<Option<Self>>
    where
        P: AsRef<Path>,
    {
        Ok(find_library(start)?.and_then(Self::new))
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &Path {
        &self.metadata
    }

    pub fn resource<P>(&self, relative: P) -> PathBuf
    where
        P: AsRef<Path>,
    {
        self.metadata.join(relative)
    }

    pub fn resolve_as_path(&self, name: &str) -> PathBuf {
        resolve_as_path(self, name)
    }

    pub fn resolve_as_tag(&self, name: &str) -> io::Result<Tag> {
        resolve_as_tag(self, name)
    }

    /// Link `file` into the directory named by `name`.
    pub fn tag<P>(&self, file: P, name: &str) -> Result<PathBuf, TagFileError>
    where
        P: AsRef<Path>,
    {
        tag(file, self.resolve_as_path(name))
    }

    /// Unlink `file` from the directory named by `name`.
    pub fn untag<P>(&self, file: P, name: &str) -> Result<PathBuf, UntagFileError>
    where
        P: AsRef<Path>,
    {
        untag(file, self.resolve_as_path(name))
    }

    /// Search with tag names in `node` resolved against this library.
    pub fn search(&self, node: &Node) -> Result<Vec<PathBuf>, SearchError> {
        search_with(node, &|name| self.resolve_as_path(name))
    }

    /// Every link to `file` in this library.
    pub fn links<P>(&self, file: P) -> io::Result<Vec<PathBuf>>
    where
        P: AsRef<Path>,
    {
        links(self, file)
    }

    /// Tags of every directory linking to `file` in this library.
    pub fn tags_of<P>(&self, file: P) -> io::Result<Vec<Tag>>
    where
        P: AsRef<Path>,
    {
        tags_of(self, file)
    }

    /// Tags directly in the directory named by `name`.
    pub fn tags_in(&self, name: &str) -> io::Result<Vec<Tag>> {
        tags_in(self, self.resolve_as_path(name))
    }
}

impl AsRef<Path> for Library {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}
