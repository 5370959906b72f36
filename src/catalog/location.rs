use std::fmt;
use std::path::PathBuf;

use reqwest::Url;

/// Where a catalog or media file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    /// Parse a site root or file reference.
    ///
    /// `http`/`https` URLs are remote; `file://` URLs and everything else
    /// (including Windows drive paths, which `Url` would accept as a scheme)
    /// are filesystem paths.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_or_else(|()| Self::Local(PathBuf::from(raw)), Self::Local),
            _ => Self::Local(PathBuf::from(raw)),
        }
    }

    /// Resolve `relative` against this location, treated as a directory.
    ///
    /// Absolute URLs in `relative` win over the base, so a catalog may point
    /// its media at another host. Returns `None` when the result is not a
    /// valid URL.
    pub fn join(&self, relative: &str) -> Option<Self> {
        let relative = relative.trim();
        if let Ok(url) = Url::parse(relative)
            && matches!(url.scheme(), "http" | "https")
        {
            return Some(Self::Remote(url));
        }

        match self {
            Self::Remote(base) => as_directory(base).join(relative).ok().map(Self::Remote),
            Self::Local(base) => Some(Self::Local(base.join(relative))),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

fn as_directory(url: &Url) -> Url {
    let mut dir = url.clone();
    if !dir.path().ends_with('/') {
        let path = format!("{}/", dir.path());
        dir.set_path(&path);
    }
    dir
}
