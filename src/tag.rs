use std::{
    borrow::Borrow,
    io,
    path::{Path, PathBuf},
};

use derive_more::Display;
use ref_cast::{ref_cast_custom, RefCastCustom};

use crate::{
    fs::{absolute, relative_to},
    TAG_PREFIX,
};

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not a tag: tags must start with `{TAG_PREFIX}`")]
pub struct NotATagError(String);

/// A library-root-relative directory,
/// written `//relative/path`.
#[derive(Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(String);

#[derive(Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, RefCastCustom)]
#[repr(transparent)]
pub struct TagRef(str);

impl Tag {
    pub fn new<S>(s: S) -> Result<Tag, NotATagError>
    where
        S: Into<String>,
    {
        let s = s.into();
        if is_tag(&s) {
            Ok(Tag(s))
        } else {
            Err(NotATagError(s))
        }
    }

    /// Tags are text,
    /// so a path that is not valid UTF-8 has no tag.
    fn from_relative_path<P>(path: P) -> io::Result<Tag>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        path.to_str()
            .map(|path| Tag(format!("{TAG_PREFIX}{path}")))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("`{}` is not valid UTF-8", path.display()),
                )
            })
    }
}

impl TagRef {
    #[ref_cast_custom]
    pub(crate) const fn new_unchecked(s: &str) -> &Self;

    /// Path of this tag relative to its library root.
    pub fn relative_path(&self) -> &Path {
        self.0.trim_start_matches('/').as_ref()
    }
}

impl AsRef<TagRef> for Tag {
    fn as_ref(&self) -> &TagRef {
        self.borrow()
    }
}

impl Borrow<TagRef> for Tag {
    fn borrow(&self) -> &TagRef {
        TagRef::new_unchecked(self.0.as_str())
    }
}

impl AsRef<TagRef> for TagRef {
    fn as_ref(&self) -> &TagRef {
        self
    }
}

pub fn is_tag(name: &str) -> bool {
    name.starts_with(TAG_PREFIX)
}

/// Tag for `path`,
/// relative to `root`.
///
/// Relative paths are taken from the working directory.
/// Paths outside `root` escape it with `..`.
/// Paths that are not valid UTF-8 are `InvalidData` errors.
pub fn path_to_tag<R, P>(root: R, path: P) -> io::Result<Tag>
where
    R: AsRef<Path>,
    P: AsRef<Path>,
{
    Tag::from_relative_path(relative_to(absolute(path)?, absolute(root)?))
}

pub fn tag_to_path<R, T>(root: R, tag: T) -> PathBuf
where
    R: AsRef<Path>,
    T: AsRef<TagRef>,
{
    let relative = tag.as_ref().relative_path();
    if relative.as_os_str().is_empty() {
        root.as_ref().to_owned()
    } else {
        root.as_ref().join(relative)
    }
}

/// `name` as a path,
/// converting it if it is a tag.
pub fn resolve_as_path<R>(root: R, name: &str) -> PathBuf
where
    R: AsRef<Path>,
{
    if is_tag(name) {
        tag_to_path(root, TagRef::new_unchecked(name))
    } else {
        PathBuf::from(name)
    }
}

/// `name` as a tag,
/// converting it if it is a path.
pub fn resolve_as_tag<R>(root: R, name: &str) -> io::Result<Tag>
where
    R: AsRef<Path>,
{
    if is_tag(name) {
        Ok(Tag(name.to_owned()))
    } else {
        path_to_tag(root, name)
    }
}
