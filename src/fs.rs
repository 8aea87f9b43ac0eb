use std::{
    env::current_dir,
    fs::{read_dir, symlink_metadata, DirEntry, Metadata},
    io,
    os::unix::fs::MetadataExt,
    path::{Component, Path, PathBuf},
};

use crate::METADATA_DIR;

/// Identity of a file, independent of the paths linking to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    /// Identity of `path` itself.
    /// Symlinks are not followed.
    pub fn of<P>(path: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self::from_metadata(&symlink_metadata(path)?))
    }

    pub(crate) fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }
}

/// Return whether `a` and `b` are links to the same file.
pub fn same_file<P, Q>(a: P, b: Q) -> io::Result<bool>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Ok(FileId::of(a)? == FileId::of(b)?)
}

/// Regular files directly in `dir`,
/// sorted by name.
pub(crate) fn read_files<P>(dir: P) -> io::Result<Vec<(FileId, PathBuf)>>
where
    P: AsRef<Path>,
{
    let mut files = Vec::new();
    for entry in sorted_entries(dir)? {
        // `DirEntry::metadata` does not traverse symlinks.
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            // The entry was removed after listing.
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if metadata.is_file() {
            files.push((FileId::from_metadata(&metadata), entry.path()));
        }
    }
    Ok(files)
}

/// Directories directly in `dir`,
/// sorted by name,
/// excluding library metadata.
pub(crate) fn read_dirs<P>(dir: P) -> io::Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    let mut dirs = Vec::new();
    for entry in sorted_entries(dir)? {
        if entry.file_name() != METADATA_DIR && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

fn sorted_entries<P>(dir: P) -> io::Result<Vec<DirEntry>>
where
    P: AsRef<Path>,
{
    let mut entries = read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

/// Call `f` for every regular file under `dir`,
/// depth-first in name order.
///
/// Symlinks and library metadata are not traversed.
pub(crate) fn for_each_file<P, F>(dir: P, mut f: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnMut(FileId, PathBuf),
{
    let mut queue = vec![dir.as_ref().to_owned()];
    while let Some(dir) = queue.pop() {
        for (id, path) in read_files(&dir)? {
            f(id, path);
        }
        // Reversed so the first directory is popped first.
        queue.extend(read_dirs(&dir)?.into_iter().rev());
    }
    Ok(())
}

/// `path` made absolute against the working directory
/// and normalized.
pub(crate) fn absolute<P>(path: P) -> io::Result<PathBuf>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    Ok(if path.is_absolute() {
        normalize(path)
    } else {
        normalize(current_dir()?.join(path))
    })
}

/// Remove `.` components and resolve `..` components lexically,
/// without touching the filesystem.
pub(crate) fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let mut normalized = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            component => normalized.push(component),
        }
    }
    normalized
}

/// `path` relative to `base`.
/// Both must be normalized and either both absolute or both relative.
pub(crate) fn relative_to<P, Q>(path: P, base: Q) -> PathBuf
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut path = path.as_ref().components().peekable();
    let mut base = base.as_ref().components().peekable();
    while let (Some(x), Some(y)) = (path.peek(), base.peek()) {
        if x != y {
            break;
        }
        path.next();
        base.next();
    }
    base.map(|_| Component::ParentDir).chain(path).collect()
}
