mod fs;
mod library;
mod link;
mod list;
mod query;
mod search;
mod tag;

#[cfg(test)]
mod testing;

pub use crate::{
    fs::{same_file, FileId},
    library::{
        find_library, find_library_from_current_dir, init_library, is_library, resource_path,
        InitError, Library,
    },
    link::{
        tag, untag, HasTagError, InvalidFileError, LacksTagError, MismatchError, NoTagDirError,
        TagFileError, UntagFileError,
    },
    list::{links, tags_in, tags_of},
    query::{parse_query, Node, Operator, ParseError},
    search::{search, SearchError},
    tag::{
        is_tag, path_to_tag, resolve_as_path, resolve_as_tag, tag_to_path, NotATagError, Tag,
        TagRef,
    },
};

/// Directory marking the root of a library.
pub const METADATA_DIR: &str = ".hardtag";
/// Prefix of library-relative tag names.
pub const TAG_PREFIX: &str = "//";

pub const AND: &str = "AND";
pub const OR: &str = "OR";
pub const CLOSER: &str = ")";
pub const QUOTE: char = '\'';
/// A leading escape makes a query word a literal directory name,
/// even if it is a keyword.
pub const ESCAPE: char = '\\';
