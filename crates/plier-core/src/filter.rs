//! FileTypeFilter — the one suffix list that decides both what the walk
//! shows and what the player is allowed to open.

/// Suffixes used when the config does not list any.
pub const DEFAULT_MEDIA_SUFFIXES: &str =
    ".mkv,.mp4,.m4v,.avi,.mov,.mpg,.mpeg,.ts,.wmv,.flv,.webm,.mp3,.m4a,.flac,.ogg,.wav";

/// Case-sensitive filename suffix set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileTypeFilter {
    suffixes: Vec<String>,
}

impl FileTypeFilter {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for s in suffixes {
            let s = s.into();
            if !s.is_empty() && !out.contains(&s) {
                out.push(s);
            }
        }
        Self { suffixes: out }
    }

    /// Parse a comma-separated list such as `".mkv, .mp4,.avi"`.
    /// Whitespace around items is dropped, empty items are skipped.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.suffixes.iter().any(|ft| name.ends_with(ft.as_str()))
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }
}
