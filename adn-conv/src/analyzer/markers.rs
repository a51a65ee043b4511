//! Marker tables for classification
//!
//! Each table maps a label to the marker strings that select it. Lookups run
//! against lower-cased text; the first entry with a matching marker wins.

use crate::models::Category;

#[derive(Debug, Clone)]
pub struct MarkerEntry<L> {
    pub label: L,
    markers: Vec<String>,
}

impl<L> MarkerEntry<L> {
    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

#[derive(Debug, Clone)]
pub struct MarkerTable<L> {
    entries: Vec<MarkerEntry<L>>,
}

impl<L> Default for MarkerTable<L> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<L> MarkerTable<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; markers are stored lower-cased
    pub fn with_entry<S: AsRef<str>>(mut self, label: L, markers: &[S]) -> Self {
        self.entries.push(MarkerEntry {
            label,
            markers: markers
                .iter()
                .map(|m| m.as_ref().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        });
        self
    }

    /// Label of the first entry with a marker contained in `haystack`
    ///
    /// `haystack` must already be lower-cased.
    pub fn first_match(&self, haystack: &str) -> Option<&L> {
        self.entries
            .iter()
            .find(|entry| entry.markers.iter().any(|m| haystack.contains(m.as_str())))
            .map(|entry| &entry.label)
    }

    pub fn entries(&self) -> &[MarkerEntry<L>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Painters recognized as the primary subject of a batch
pub fn default_subjects() -> MarkerTable<String> {
    MarkerTable::new()
        .with_entry("Rembrandt".to_string(), &["rembrandt"])
        .with_entry("Vermeer".to_string(), &["vermeer"])
        .with_entry("Caravaggio".to_string(), &["caravaggio", "caravage"])
        .with_entry("Monet".to_string(), &["monet"])
        .with_entry("Van Gogh".to_string(), &["van gogh", "van_gogh", "vangogh"])
        .with_entry("Turner".to_string(), &["turner"])
        .with_entry("Hopper".to_string(), &["hopper"])
        .with_entry("Klimt".to_string(), &["klimt"])
        .with_entry("Hokusai".to_string(), &["hokusai"])
}

/// Analysis axes a batch can be filed under
pub fn default_categories() -> MarkerTable<Category> {
    MarkerTable::new()
        .with_entry(Category::Composition, &["composition", "sujet", "cadrage", "layout"])
        .with_entry(Category::Color, &["couleur", "colour", "color", "palette", "saturation"])
        .with_entry(
            Category::Light,
            &["lumiere", "lumière", "light", "contraste", "contrast", "chiaroscuro", "clair-obscur"],
        )
        .with_entry(Category::Finish, &["finition", "finish", "texture", "grain", "vernis"])
}
