//! Habit ID generation and resolution
//!
//! All IDs use the format: `{6-hex-digit sequence}-{slug}`
//! Example: `00002a-drink-water`

use tracing::debug;

/// Slug used when a name has no alphanumeric characters
const FALLBACK_SLUG: &str = "habit";

/// Generate a habit ID from a per-store sequence number and the habit name
pub fn generate_id(seq: u64, name: &str) -> String {
    let slug = slugify(name);
    let slug = if slug.is_empty() { FALLBACK_SLUG.to_string() } else { slug };
    format!("{:06x}-{}", seq, slug)
}

/// Slugify a name for use in IDs
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Habit ID wrapper for type-safe ID handling
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HabitId(String);

impl HabitId {
    /// Create a new ID from a sequence number and habit name
    pub fn new(seq: u64, name: &str) -> Self {
        Self(generate_id(seq, name))
    }

    /// Get the sequence prefix (everything before the first hyphen)
    pub fn seq_prefix(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Get the slug portion
    pub fn slug(&self) -> Option<&str> {
        self.0.split_once('-').map(|(_, slug)| slug)
    }

    /// Get the full ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HabitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HabitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HabitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for HabitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for HabitId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for HabitId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// ID resolution for partial matches typed at the prompt
pub struct IdResolver<'a> {
    ids: Vec<&'a HabitId>,
}

impl<'a> IdResolver<'a> {
    pub fn new(ids: impl IntoIterator<Item = &'a HabitId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Resolve a partial reference to a full ID
    ///
    /// Returns:
    /// - Ok(Some(id)) if exactly one match (an exact match always wins)
    /// - Ok(None) if no matches
    /// - Err with candidates if ambiguous
    pub fn resolve(&self, reference: &str) -> Result<Option<HabitId>, Vec<HabitId>> {
        debug!(%reference, candidates = self.ids.len(), "IdResolver::resolve: called");
        if let Some(exact) = self.ids.iter().find(|id| id.as_str() == reference) {
            return Ok(Some((*exact).clone()));
        }

        let mut matches: Vec<HabitId> = self
            .ids
            .iter()
            .filter(|id| Self::matches(id, reference))
            .map(|id| (*id).clone())
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(matches),
        }
    }

    /// Check if an ID matches a reference
    fn matches(id: &HabitId, reference: &str) -> bool {
        if reference.is_empty() {
            return false;
        }

        // Sequence prefix match
        if id.as_str().starts_with(reference) {
            return true;
        }

        // Slug contains match
        id.slug().is_some_and(|slug| slug.contains(reference))
    }
}
