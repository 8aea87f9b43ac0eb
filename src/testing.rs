use std::{
    fs::{create_dir_all, hard_link, File},
    path::Path,
};

use crate::Node;

pub fn with_temp_dir<F, R>(f: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let dir = tempfile::tempdir().unwrap();
    f(dir.path())
}

pub fn create_files_relative_to<P, Q>(dir: P, paths: impl IntoIterator<Item = Q>)
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    for path in paths {
        let path = dir.as_ref().join(path);
        create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }
}

pub fn create_dirs_relative_to<P, Q>(dir: P, paths: impl IntoIterator<Item = Q>)
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    for path in paths {
        create_dir_all(dir.as_ref().join(path)).unwrap();
    }
}

pub fn link_relative_to<P, Q, R>(dir: P, original: Q, link: R)
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let link = dir.as_ref().join(link);
    create_dir_all(link.parent().unwrap()).unwrap();
    hard_link(dir.as_ref().join(original), link).unwrap();
}

/// `A = {a, b, c}`, `B = {b, c}`, `C = {c, d}`,
/// where `b` and `c` are the same files everywhere.
pub fn create_abc_relative_to<P>(dir: P)
where
    P: AsRef<Path>,
{
    create_files_relative_to(&dir, ["A/a", "A/b", "A/c", "C/d"]);
    link_relative_to(&dir, "A/b", "B/b");
    link_relative_to(&dir, "A/c", "B/c");
    link_relative_to(&dir, "A/c", "C/c");
}

pub fn dir<P>(dir: P, name: &str) -> Node
where
    P: AsRef<Path>,
{
    Node::Dir(dir.as_ref().join(name).into_os_string().into_string().unwrap())
}
