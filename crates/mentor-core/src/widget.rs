use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    #[error("Widget '{0}' not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiWidget {
    pub id: String,
    pub prompt: String,
    /// Generated JSX source. Compiled and rendered by the browser, never here.
    pub markup: String,
    pub last_updated_at: DateTime<Utc>,
}

impl AiWidget {
    pub fn new(prompt: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            markup: markup.into(),
            last_updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetCollection {
    pub widgets: Vec<AiWidget>,
    pub active_widget_id: Option<String>,
}

impl WidgetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AiWidget> {
        self.widgets.iter().find(|widget| widget.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn active(&self) -> Option<&AiWidget> {
        self.active_widget_id.as_deref().and_then(|id| self.get(id))
    }

    /// Inserts a widget and makes it the active one.
    pub fn create(&mut self, prompt: &str, markup: &str) -> &AiWidget {
        self.insert(AiWidget::new(prompt, markup))
    }

    pub fn insert(&mut self, widget: AiWidget) -> &AiWidget {
        self.active_widget_id = Some(widget.id.clone());
        self.widgets.push(widget);
        &self.widgets[self.widgets.len() - 1]
    }

    /// Replaces prompt and markup in place and bumps the timestamp.
    pub fn update(&mut self, id: &str, prompt: &str, markup: &str) -> Result<&AiWidget, WidgetError> {
        let widget = self
            .widgets
            .iter_mut()
            .find(|widget| widget.id == id)
            .ok_or_else(|| WidgetError::NotFound(id.to_string()))?;
        widget.prompt = prompt.to_string();
        widget.markup = markup.to_string();
        widget.last_updated_at = Utc::now();
        Ok(&*widget)
    }

    pub fn delete(&mut self, id: &str) -> Result<AiWidget, WidgetError> {
        let index = self
            .widgets
            .iter()
            .position(|widget| widget.id == id)
            .ok_or_else(|| WidgetError::NotFound(id.to_string()))?;
        if self.active_widget_id.as_deref() == Some(id) {
            self.active_widget_id = None;
        }
        Ok(self.widgets.remove(index))
    }

    pub fn clear(&mut self) {
        self.widgets.clear();
        self.active_widget_id = None;
    }

    pub fn set_active(&mut self, id: Option<&str>) -> Result<(), WidgetError> {
        match id {
            Some(id) if !self.contains(id) => Err(WidgetError::NotFound(id.to_string())),
            Some(id) => {
                self.active_widget_id = Some(id.to_string());
                Ok(())
            }
            None => {
                self.active_widget_id = None;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_makes_widget_active() {
        let mut widgets = WidgetCollection::new();
        let id = widgets.create("a clock", "<div/>").id.clone();

        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets.active().map(|w| w.id.as_str()), Some(id.as_str()));
    }

    #[test]
    fn update_replaces_in_place_and_bumps_timestamp() {
        let mut widgets = WidgetCollection::new();
        let original = widgets.create("a red button", "<button/>").clone();

        let updated = widgets
            .update(&original.id, "a red button with shadow", "<button class=\"shadow\"/>")
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.prompt, "a red button with shadow");
        assert!(updated.last_updated_at >= original.last_updated_at);
        assert_eq!(widgets.len(), 1);
    }

    #[test]
    fn update_unknown_widget_leaves_collection_unchanged() {
        let mut widgets = WidgetCollection::new();
        widgets.create("a clock", "<div/>");
        let snapshot = widgets.clone();

        let result = widgets.update("w1", "a red clock with shadow", "<div/>");

        assert_eq!(result, Err(WidgetError::NotFound("w1".to_string())));
        assert_eq!(widgets, snapshot);
    }

    #[test]
    fn delete_and_clear_reset_active_pointer() {
        let mut widgets = WidgetCollection::new();
        let first = widgets.create("one", "<a/>").id.clone();
        widgets.create("two", "<b/>");

        widgets.set_active(Some(first.as_str())).unwrap();
        widgets.delete(&first).unwrap();
        assert!(widgets.active_widget_id.is_none());

        widgets.clear();
        assert!(widgets.is_empty());
        assert!(widgets.set_active(Some("missing")).is_err());
    }
}
