use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    rc::Rc,
};

/// `Source` represents some literal source code -- whether a REPL session,
/// a file on disk, or an embedded snippet. It's essentially a string with a
/// path, the path serving as the source's name. Sources without a path
/// point to `./source`.
#[derive(Debug, PartialEq, Eq)]
pub struct Source {
    pub contents: String,
    pub path: PathBuf,
}

impl Source {
    /// Creates a new `Source` given both an `&str` and a `Path`.
    /// Prefer `Source::path` or `Source::source` over calling this directly.
    pub fn new(contents: &str, path: &Path) -> Rc<Source> {
        Rc::new(Source {
            contents: contents.to_string(),
            path: path.to_owned(),
        })
    }

    /// Builds a `Source` by reading a file from disk.
    pub fn path(path: &Path) -> std::io::Result<Rc<Source>> {
        let mut contents = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut contents)?;
        Ok(Source::new(&contents, path))
    }

    /// Builds a `Source` containing just a string, for the REPL or tests.
    /// Points towards `./source`.
    pub fn source(contents: &str) -> Rc<Source> {
        Source::new(contents, &PathBuf::from("./source"))
    }
}
