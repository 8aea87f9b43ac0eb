use super::*;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(
        "`{}` already has a `{}` directory. It is already the root of a library.",
        .0.display(),
        METADATA_DIR
    )]
    AlreadyLibrary(PathBuf),
    #[error(
        "`{}` has a file named `{}`. Please move it before initializing.",
        .0.display(),
        METADATA_DIR
    )]
    FileExists(PathBuf),
    #[error("Failed to create `{}`: {}", .0.display(), .1)]
    Filesystem(PathBuf, #[source] io::Error),
}

/// Make `dir` the root of a new library.
pub fn init_library<P>(dir: P) -> Result<(), InitError>
where
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    let metadata = dir.join(METADATA_DIR);
    match create_dir(&metadata) {
        Ok(()) => {
            debug!("Created `{}`", metadata.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if metadata.is_dir() {
                Err(InitError::AlreadyLibrary(dir.to_owned()))
            } else {
                Err(InitError::FileExists(dir.to_owned()))
            }
        }
        Err(e) => Err(InitError::Filesystem(metadata, e)),
    }
}

impl Library {
    pub fn init<P>(path: P) -> Result<Self, InitError>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        init_library(&path)?;
        let metadata = path.join(METADATA_DIR);
        Ok(Self { path, metadata })
    }
}
