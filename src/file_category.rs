/// Extension-based file classification.
///
/// This module maps a file name to one of a fixed set of categories using its
/// extension. Each category owns the name of the destination subfolder that
/// files of that group are moved into.
///
/// # Examples
///
/// ```
/// use tidyup::file_category::{Category, ExtensionRules};
///
/// let rules = ExtensionRules::default();
/// assert_eq!(rules.classify("photo.JPG"), Category::Photos);
/// assert_eq!(rules.classify("notes.txt"), Category::Texts);
/// assert_eq!(rules.classify("mystery.bin"), Category::Other);
/// ```
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Represents a broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Photos and still images (JPG, PNG, GIF)
    Photos,
    /// Office documents (PDF, DOCX)
    Documents,
    /// Plain text files
    Texts,
    /// Audio files (MP3, WAV)
    Music,
    /// Video files (MP4, MKV, AVI)
    Videos,
    /// Compressed archives (ZIP, RAR)
    Archives,
    /// Anything no rule matches
    Other,
}

impl Category {
    /// Returns the destination subfolder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidyup::file_category::Category;
    ///
    /// assert_eq!(Category::Photos.dir_name(), "Fotos");
    /// assert_eq!(Category::Archives.dir_name(), "Comprimidos");
    /// assert_eq!(Category::Other.dir_name(), "Otros");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Photos => "Fotos",
            Category::Documents => "Documentos",
            Category::Texts => "Textos",
            Category::Music => "Música",
            Category::Videos => "Videos",
            Category::Archives => "Comprimidos",
            Category::Other => "Otros",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Maps normalized extensions (lowercase, with the leading dot) to categories.
///
/// Rules are fixed once the batch starts; anything without a rule falls back
/// to [`Category::Other`].
#[derive(Debug, Clone)]
pub struct ExtensionRules {
    rules: HashMap<String, Category>,
}

impl ExtensionRules {
    /// Creates a rule set populated with the standard mappings.
    pub fn new() -> Self {
        let mut rules = Self::empty();
        rules.populate_standard_rules();
        rules
    }

    /// Creates a rule set with no mappings; every file classifies as `Other`.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    fn populate_standard_rules(&mut self) {
        for ext in ["jpg", "jpeg", "png", "gif"] {
            self.add_rule(ext, Category::Photos);
        }
        for ext in ["pdf", "docx"] {
            self.add_rule(ext, Category::Documents);
        }
        self.add_rule("txt", Category::Texts);
        for ext in ["mp3", "wav"] {
            self.add_rule(ext, Category::Music);
        }
        for ext in ["mp4", "mkv", "avi"] {
            self.add_rule(ext, Category::Videos);
        }
        for ext in ["zip", "rar"] {
            self.add_rule(ext, Category::Archives);
        }
    }

    /// Adds (or replaces) a rule. Accepts `"jpg"`, `".jpg"` or `".JPG"` alike.
    pub fn add_rule(&mut self, ext: &str, category: Category) {
        self.rules.insert(normalize_extension(ext), category);
    }

    /// Looks up a normalized extension such as `".png"`.
    pub fn lookup(&self, ext: &str) -> Option<Category> {
        self.rules.get(&normalize_extension(ext)).copied()
    }

    /// Returns the category for a file name or path.
    ///
    /// Files without an extension, and dotfiles such as `.bashrc`, have no
    /// extension to match and land in [`Category::Other`].
    pub fn classify(&self, file_name: impl AsRef<Path>) -> Category {
        extension_of(file_name.as_ref())
            .and_then(|ext| self.rules.get(&ext).copied())
            .unwrap_or(Category::Other)
    }

    /// Number of extensions with a rule.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ExtensionRules {
    fn default() -> Self {
        Self::new()
    }
}

static STANDARD_RULES: LazyLock<ExtensionRules> = LazyLock::new(ExtensionRules::new);

/// Classifies a file name against the standard rules.
///
/// ```
/// use tidyup::file_category::{classify, Category};
///
/// assert_eq!(classify("/tmp/archive.ZIP"), Category::Archives);
/// ```
pub fn classify(file_name: impl AsRef<Path>) -> Category {
    STANDARD_RULES.classify(file_name)
}

/// Returns the extension of `path` as `".ext"`, lowercased.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
