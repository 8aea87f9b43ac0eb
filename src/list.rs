use std::{
    io,
    path::{Path, PathBuf},
};

use itertools::Itertools;

use crate::{
    fs::{for_each_file, read_dirs},
    tag::path_to_tag,
    FileId, Tag,
};

/// Every link to `file` under `root`,
/// depth-first in name order.
pub fn links<R, P>(root: R, file: P) -> io::Result<Vec<PathBuf>>
where
    R: AsRef<Path>,
    P: AsRef<Path>,
{
    let id = FileId::of(file)?;
    let mut links = Vec::new();
    for_each_file(root, |other, path| {
        if other == id {
            links.push(path);
        }
    })?;
    Ok(links)
}

/// Tags of every directory under `root` linking to `file`.
pub fn tags_of<R, P>(root: R, file: P) -> io::Result<Vec<Tag>>
where
    R: AsRef<Path>,
    P: AsRef<Path>,
{
    links(&root, file)?
        .iter()
        .filter_map(|link| link.parent())
        .unique()
        .map(|dir| path_to_tag(&root, dir))
        .collect()
}

/// Tags of directories directly in `dir`.
pub fn tags_in<R, P>(root: R, dir: P) -> io::Result<Vec<Tag>>
where
    R: AsRef<Path>,
    P: AsRef<Path>,
{
    read_dirs(dir)?
        .into_iter()
        .map(|dir| path_to_tag(&root, dir))
        .collect()
}
