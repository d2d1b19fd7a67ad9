//! Prompts sent to the vision model.
//!
//! Each prompt produces the text for exactly one sidecar field, so the
//! prompt string itself is what decides where a response ends up.

use crate::metadata::Field;

/// Prompt asking for a short artistic title.
pub const TITLE_PROMPT: &str =
    "Please give the photo an artistic title. Avoid naming locations or people.";

/// Prompt asking for a free-form description.
pub const DESCRIPTION_PROMPT: &str =
    "Please provide a description of what is on the photo. Avoid repetitive sentences and words.";

/// Prompt asking for a comma separated keyword list.
pub const KEYWORDS_PROMPT: &str =
    "Please provide a minimum of 10 precise keywords separated by commas.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub title: String,
    pub description: String,
    pub keywords: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            title: TITLE_PROMPT.to_string(),
            description: DESCRIPTION_PROMPT.to_string(),
            keywords: KEYWORDS_PROMPT.to_string(),
        }
    }
}

impl Prompts {
    /// Field a response to `prompt` is written to.
    ///
    /// Matching is exact string equality; anything else maps to nothing.
    pub fn field_for(&self, prompt: &str) -> Option<Field> {
        if prompt == self.keywords {
            Some(Field::Subject)
        } else if prompt == self.description {
            Some(Field::Description)
        } else if prompt == self.title {
            Some(Field::Title)
        } else {
            None
        }
    }

    /// Every prompt is non-blank and differs from the other two, so each
    /// one maps back to its own field.
    pub fn is_distinct(&self) -> bool {
        let all = [&self.title, &self.description, &self.keywords];
        all.iter().all(|p| !p.trim().is_empty())
            && self.title != self.description
            && self.title != self.keywords
            && self.description != self.keywords
    }

    pub fn prompt_for(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Subject => &self.keywords,
        }
    }
}
