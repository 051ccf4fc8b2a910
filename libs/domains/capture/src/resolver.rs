//! Raw detection labels to inventory keys

/// Maps a model label to the inventory item name it should count as.
///
/// `None` means the label is not usable as a key; the capture is treated as
/// if nothing was detected.
pub trait NameResolver: Send + Sync {
    fn resolve(&self, raw_label: &str) -> Option<String>;
}

/// Identity mapping with guards against unusable labels
#[derive(Debug, Clone)]
pub struct LabelResolver {
    max_length: usize,
    lowercase: bool,
}

impl LabelResolver {
    pub const DEFAULT_MAX_LENGTH: usize = 100;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Fold labels to lower case, so "Bottle" and "bottle" share an item
    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }
}

impl Default for LabelResolver {
    fn default() -> Self {
        Self {
            max_length: Self::DEFAULT_MAX_LENGTH,
            lowercase: false,
        }
    }
}

impl NameResolver for LabelResolver {
    fn resolve(&self, raw_label: &str) -> Option<String> {
        let label = raw_label.trim();
        if label.is_empty() || label.chars().count() > self.max_length {
            return None;
        }

        if self.lowercase {
            Some(label.to_lowercase())
        } else {
            Some(label.to_string())
        }
    }
}
