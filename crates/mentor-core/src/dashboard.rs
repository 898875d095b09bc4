//! Cross-session dashboard pins.
//!
//! Pins are weak references: a pinned widget that no longer exists in any
//! session is skipped on resolution instead of raising an error.

use serde::{Deserialize, Serialize};

use crate::session::SessionStore;
use crate::widget::AiWidget;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPins {
    widget_ids: Vec<String>,
}

impl DashboardPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the widget was already pinned.
    pub fn pin(&mut self, widget_id: &str) -> bool {
        if self.is_pinned(widget_id) {
            return false;
        }
        self.widget_ids.push(widget_id.to_string());
        true
    }

    pub fn unpin(&mut self, widget_id: &str) -> bool {
        let before = self.widget_ids.len();
        self.widget_ids.retain(|id| id != widget_id);
        before != self.widget_ids.len()
    }

    pub fn is_pinned(&self, widget_id: &str) -> bool {
        self.widget_ids.iter().any(|id| id == widget_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.widget_ids
    }

    /// Resolves pins against a set of widgets, in pin order.
    pub fn resolve<'a, I>(&self, widgets: I) -> Vec<&'a AiWidget>
    where
        I: IntoIterator<Item = &'a AiWidget>,
    {
        let available: Vec<&AiWidget> = widgets.into_iter().collect();
        self.widget_ids
            .iter()
            .filter_map(|id| available.iter().find(|widget| &widget.id == id).copied())
            .collect()
    }

    /// Resolves pins against every session in the store.
    pub async fn resolve_in_store(&self, store: &SessionStore) -> Vec<AiWidget> {
        let mut owned = Vec::new();
        for handle in store.handles() {
            let session = handle.read().await;
            owned.extend(
                session
                    .widgets
                    .widgets
                    .iter()
                    .filter(|widget| self.is_pinned(&widget.id))
                    .cloned(),
            );
        }
        self.resolve(owned.iter()).into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetCollection;

    #[test]
    fn pin_is_idempotent() {
        let mut pins = DashboardPins::new();
        assert!(pins.pin("w1"));
        assert!(!pins.pin("w1"));
        assert_eq!(pins.ids(), ["w1".to_string()]);
        assert!(pins.unpin("w1"));
        assert!(!pins.unpin("w1"));
    }

    #[test]
    fn removed_widget_is_skipped_silently() {
        let mut widgets = WidgetCollection::new();
        let kept = widgets.create("kept", "<a/>").id.clone();
        let removed = widgets.create("removed", "<b/>").id.clone();

        let mut pins = DashboardPins::new();
        pins.pin(&removed);
        pins.pin(&kept);

        widgets.delete(&removed).unwrap();

        let resolved = pins.resolve(widgets.widgets.iter());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, kept);
        assert!(pins.is_pinned(&removed));
    }

    #[tokio::test]
    async fn resolves_across_sessions_in_pin_order() {
        let store = SessionStore::new();
        let first = store.create("default");
        let second = store.create("widget_factory");

        let a = first.write().await.widgets.create("a", "<a/>").id.clone();
        let b = second.write().await.widgets.create("b", "<b/>").id.clone();

        let mut pins = DashboardPins::new();
        pins.pin(&b);
        pins.pin(&a);

        let resolved = pins.resolve_in_store(&store).await;
        let ids: Vec<&str> = resolved.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec![b.as_str(), a.as_str()]);

        let second_id = second.read().await.id.clone();
        store.remove(&second_id);
        let resolved = pins.resolve_in_store(&store).await;
        assert_eq!(resolved.len(), 1);
    }
}
