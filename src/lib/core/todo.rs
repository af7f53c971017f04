use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const TITLE_REQUIRED: &str = "Todo musí mít vyplněný název";
pub const PRIORITY_REQUIRED: &str = "Todo musí mít přiřazenou prioritu";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub priority: Option<String>,
    pub done: bool,
}

/// Partial update of a todo. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub priority: Option<String>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.priority.is_none()
    }
}

/// Form body of `POST /add-todo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTodoForm {
    pub title: Option<String>,
}

/// Form body of `POST /update-todo/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTodoForm {
    pub title: Option<String>,
    pub priority: Option<String>,
}

fn filled(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl NewTodoForm {
    /// Returns the trimmed title, or every violated rule.
    pub fn validate(&self) -> Result<String, Vec<&'static str>> {
        match filled(&self.title) {
            Some(title) => Ok(title.to_string()),
            None => Err(vec![TITLE_REQUIRED]),
        }
    }
}

impl UpdateTodoForm {
    /// All rules are checked; violations are reported together.
    pub fn validate(&self) -> Result<TodoChanges, Vec<&'static str>> {
        let title = filled(&self.title);
        let priority = filled(&self.priority);

        let mut errors = Vec::new();
        if title.is_none() {
            errors.push(TITLE_REQUIRED);
        }
        if priority.is_none() {
            errors.push(PRIORITY_REQUIRED);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TodoChanges {
            title: title.map(str::to_string),
            priority: priority.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_titles_are_rejected() {
        for title in [None, Some(""), Some("   "), Some("\t\n")] {
            let form = NewTodoForm { title: title.map(String::from) };
            assert_eq!(form.validate(), Err(vec![TITLE_REQUIRED]));
        }
    }

    #[test]
    fn new_title_is_trimmed() {
        let form = NewTodoForm { title: Some("  Nakoupit  ".into()) };
        assert_eq!(form.validate(), Ok("Nakoupit".to_string()));
    }

    #[test]
    fn update_reports_every_violation() {
        let form = UpdateTodoForm::default();
        assert_eq!(form.validate(), Err(vec![TITLE_REQUIRED, PRIORITY_REQUIRED]));

        let form = UpdateTodoForm { title: Some(String::new()), priority: Some("high".into()) };
        assert_eq!(form.validate(), Err(vec![TITLE_REQUIRED]));

        let form = UpdateTodoForm { title: Some("x".into()), priority: Some(" ".into()) };
        assert_eq!(form.validate(), Err(vec![PRIORITY_REQUIRED]));
    }

    #[test]
    fn valid_update_carries_both_fields() {
        let form = UpdateTodoForm { title: Some(" x ".into()), priority: Some("high".into()) };
        let changes = form.validate().unwrap();
        assert_eq!(changes.title.as_deref(), Some("x"));
        assert_eq!(changes.priority.as_deref(), Some("high"));
        assert!(!changes.is_empty());
    }
}
