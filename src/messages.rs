//! User-facing strings.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn messages(self) -> Messages {
        match self {
            Self::En => Messages {
                hint: HintMessages {
                    entered: "entered characters",
                    recommendation: "recommendation",
                    minimum: "minimum",
                    maximum: "maximum",
                },
                delete_button: "Delete",
                delete_failed: "Deletion failed",
            },
            Self::Ru => Messages {
                hint: HintMessages {
                    entered: "Введено символов",
                    recommendation: "рекомендация",
                    minimum: "минимум",
                    maximum: "максимум",
                },
                delete_button: "Удалить",
                delete_failed: "Ошибка удаления",
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HintMessages {
    pub entered: &'static str,
    pub recommendation: &'static str,
    pub minimum: &'static str,
    pub maximum: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Messages {
    pub hint: HintMessages,
    pub delete_button: &'static str,
    /// Prefix of the message shown when an instant delete fails.
    pub delete_failed: &'static str,
}

impl Default for Messages {
    fn default() -> Self {
        Locale::default().messages()
    }
}
