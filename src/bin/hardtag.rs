use std::{fmt::Display, path::PathBuf};

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use hardtag::{init_library, parse_query, Library, TagFileError, UntagFileError};
use indoc::indoc;
use itertools::Itertools;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

const QUERY_HELP: &str = indoc! {r"
    Print one path for each file matching a query

    Queries are words separated by whitespace.
    A word names a directory,
    matching the files directly in it.
    Words starting with `//` are tags,
    relative to the library root.

    `AND word... )` matches files in every word.
    `OR word... )` matches files in any word.
    Groups nest,
    as in `AND foo OR bar baz ) )`.

    Text in single quotes can contain whitespace.
    One leading `\` is removed from a word,
    so `\AND` names a directory called `AND`.

    Files are compared by identity,
    so a file linked into many directories is printed once.
"};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory to start looking for a library from
    #[arg(long, global = true, env = "HARDTAG_ROOT", value_name = "ROOT")]
    root: Option<PathBuf>,

    /// Print operations taken by the program, repeat for more detail
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make a directory the root of a new library
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Tag files by linking them into tag directories
    #[command(override_usage = "hardtag tag -f <FILE>... -- <TAG>...")]
    Tag {
        /// Files to tag
        #[arg(short = 'f', required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Tags or directories to link files into
        #[arg(required = true, last = true, value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Untag files by unlinking them from tag directories
    #[command(override_usage = "hardtag untag -f <FILE>... -- <TAG>...")]
    Untag {
        /// Files to untag
        #[arg(short = 'f', required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Tags or directories to unlink files from
        #[arg(required = true, last = true, value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Print files matching a query
    #[command(long_about = QUERY_HELP)]
    Search {
        #[arg(required = true, value_name = "WORD", allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Print tags of a file, or tags in a directory
    List {
        /// Print every link to the file instead of its tags
        #[arg(long)]
        links: bool,

        /// File, directory, or tag
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Init { path } => {
            init_library(&path)?;
            info!("Initialized library at `{}`", path.display());
        }
        Commands::Tag { files, tags } => {
            let library = library(args.root)?;
            for_each_pair(
                "tag",
                &files,
                &tags,
                |file, tag| library.tag(file, tag),
                TagFileError::is_conflict,
            )?;
        }
        Commands::Untag { files, tags } => {
            let library = library(args.root)?;
            for_each_pair(
                "untag",
                &files,
                &tags,
                |file, tag| library.untag(file, tag),
                UntagFileError::is_conflict,
            )?;
        }
        Commands::Search { query } => {
            let library = library(args.root)?;
            let query = query.join(" ");
            let node = parse_query(&query).with_context(|| format!("Invalid query `{query}`"))?;
            info!("Searching for `{node}`");
            for path in library.search(&node)? {
                println!("{}", path.display());
            }
        }
        Commands::List { links, path } => {
            print_lines(list(&library(args.root)?, links, &path)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn library(root: Option<PathBuf>) -> anyhow::Result<Library> {
    let start = root.unwrap_or_default();
    Library::find(&start)?.with_context(|| {
        format!(
            "No library found in `{}` or its parents. Run `hardtag init` to create one.",
            if start.as_os_str().is_empty() {
                "the working directory".to_owned()
            } else {
                start.display().to_string()
            }
        )
    })
}

/// Apply `op` to every file and tag.
///
/// Failures are logged without stopping the rest.
/// Conflicts,
/// like tagging an already tagged file,
/// are not failures.
fn for_each_pair<E, F>(
    verb: &str,
    files: &[PathBuf],
    tags: &[String],
    mut op: F,
    is_conflict: fn(&E) -> bool,
) -> anyhow::Result<()>
where
    E: Display,
    F: FnMut(&PathBuf, &str) -> Result<PathBuf, E>,
{
    let mut failures = 0;
    for (file, tag) in files.iter().cartesian_product(tags) {
        match op(file, tag.as_str()) {
            Ok(link) => info!("{}", link.display()),
            Err(e) if is_conflict(&e) => {
                warn!("Skipping `{}` for `{tag}`: {e}", file.display());
            }
            Err(e) => {
                error!("Failed to {verb} `{}` with `{tag}`: {e}", file.display());
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!(
            "Failed to {verb} {failures} of {} file and tag pairs",
            files.len() * tags.len()
        );
    }
    Ok(())
}

/// Tags or links of a file,
/// or tags in a directory.
fn list(library: &Library, links: bool, path: &str) -> anyhow::Result<Vec<String>> {
    let resolved = library.resolve_as_path(path);
    if resolved.is_file() {
        Ok(if links {
            library
                .links(&resolved)?
                .iter()
                .map(|link| link.display().to_string())
                .collect()
        } else {
            library
                .tags_of(&resolved)?
                .iter()
                .map(ToString::to_string)
                .collect()
        })
    } else if resolved.is_dir() {
        if links {
            bail!(
                "`{}` is a directory, `--links` only lists links of files",
                resolved.display()
            );
        }
        Ok(library
            .tags_in(path)?
            .iter()
            .map(ToString::to_string)
            .collect())
    } else {
        bail!("`{}` does not exist", resolved.display());
    }
}

fn print_lines(items: impl IntoIterator<Item = impl Display>) {
    let items = items.into_iter().collect_vec();
    if !items.is_empty() {
        println!("{}", items.iter().format("\n"));
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, hard_link, write};

    use super::*;

    fn with_library<F>(f: F)
    where
        F: FnOnce(&Library),
    {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::init(dir.path()).unwrap();
        create_dir_all(dir.path().join("A")).unwrap();
        create_dir_all(dir.path().join("B")).unwrap();
        write(dir.path().join("A/a"), "").unwrap();
        hard_link(dir.path().join("A/a"), dir.path().join("B/a")).unwrap();
        f(&library);
    }

    #[test]
    fn list_prints_tags_or_links_of_file() {
        with_library(|library| {
            let file = library.as_path().join("A/a");
            let file = file.to_str().unwrap();
            assert_eq!(list(library, false, file).unwrap(), ["//A", "//B"]);
            assert_eq!(
                list(library, true, file).unwrap(),
                ["A/a", "B/a"].map(|path| library.as_path().join(path).display().to_string())
            );
        })
    }

    #[test]
    fn list_prints_tags_in_dir() {
        with_library(|library| {
            assert_eq!(list(library, false, "//").unwrap(), ["//A", "//B"]);
        })
    }

    #[test]
    fn list_rejects_links_of_dir() {
        with_library(|library| {
            assert!(list(library, true, "//A").is_err());
        })
    }

    #[test]
    fn list_errors_on_missing_path() {
        with_library(|library| {
            assert!(list(library, false, "//missing").is_err());
        })
    }
}
