use std::{
    io,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::{fs::read_files, FileId, Node};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("`{}` does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("`{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("Failed to read `{}`: {}", .0.display(), .1)]
    Filesystem(PathBuf, #[source] io::Error),
}

/// Files matching a node,
/// one per identity,
/// in result order.
type Matches = Vec<(FileId, PathBuf)>;

/// Return one path for each file matching `node`.
///
/// `Dir` names are paths,
/// relative to the working directory.
/// A missing directory fails the whole search.
pub fn search(node: &Node) -> Result<Vec<PathBuf>, SearchError> {
    search_with(node, &|name| PathBuf::from(name))
}

pub(crate) fn search_with<F>(node: &Node, resolve: &F) -> Result<Vec<PathBuf>, SearchError>
where
    F: Fn(&str) -> PathBuf,
{
    Ok(evaluate(node, resolve)?
        .into_iter()
        .map(|(_, path)| path)
        .collect())
}

fn evaluate<F>(node: &Node, resolve: &F) -> Result<Matches, SearchError>
where
    F: Fn(&str) -> PathBuf,
{
    match node {
        Node::Dir(name) => list(&resolve(name)),
        Node::And(children) => Ok(intersection(evaluate_all(children, resolve)?)),
        Node::Or(children) => Ok(union(evaluate_all(children, resolve)?)),
    }
}

fn evaluate_all<F>(children: &[Node], resolve: &F) -> Result<Vec<Matches>, SearchError>
where
    F: Fn(&str) -> PathBuf,
{
    children
        .iter()
        .map(|child| stacker::maybe_grow(32 * 1024, 1024 * 1024, || evaluate(child, resolve)))
        .collect()
}

fn list(dir: &Path) -> Result<Matches, SearchError> {
    debug!("Reading `{}`", dir.display());
    match read_files(dir) {
        // A directory can hold more than one link to the same file.
        Ok(files) => Ok(union([files])),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SearchError::NotFound(dir.to_owned())),
        Err(e) => {
            if dir.exists() && !dir.is_dir() {
                Err(SearchError::NotADirectory(dir.to_owned()))
            } else {
                Err(SearchError::Filesystem(dir.to_owned(), e))
            }
        }
    }
}

/// Files in every set,
/// represented by their path in the first set,
/// in the order of the first set.
fn intersection(sets: Vec<Matches>) -> Matches {
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return Vec::new();
    };
    let rest = sets
        .map(|set| set.into_iter().map(|(id, _)| id).collect::<FxHashSet<_>>())
        .collect::<Vec<_>>();
    first
        .into_iter()
        .filter(|(id, _)| rest.iter().all(|set| set.contains(id)))
        .collect()
}

/// Files in any set,
/// represented by their first path,
/// in order of first appearance.
fn union(sets: impl IntoIterator<Item = Matches>) -> Matches {
    let mut seen = FxHashSet::default();
    sets.into_iter()
        .flatten()
        .filter(|(id, _)| seen.insert(*id))
        .collect()
}
