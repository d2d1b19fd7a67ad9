use crate::metadata::Field;

/// Progress of one image through its three prompts.
///
/// A stage advances once its prompt has been attempted, successful or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Pending,
    TitleDone,
    DescriptionDone,
    Complete,
}

impl Stage {
    /// Field queried next, `None` once every prompt has run.
    pub fn pending_field(self) -> Option<Field> {
        match self {
            Stage::Pending => Some(Field::Title),
            Stage::TitleDone => Some(Field::Description),
            Stage::DescriptionDone => Some(Field::Subject),
            Stage::Complete => None,
        }
    }

    pub fn advance(self) -> Self {
        match self {
            Stage::Pending => Stage::TitleDone,
            Stage::TitleDone => Stage::DescriptionDone,
            Stage::DescriptionDone | Stage::Complete => Stage::Complete,
        }
    }

    pub fn is_complete(self) -> bool {
        self == Stage::Complete
    }
}
