//! Accessibility selector: a flat list of jump targets kept in step with the view.

use serde::Serialize;

use super::segments::latest_at_or_before;
use crate::entities::AxisValue;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorOption {
    pub label: String,
    pub value: AxisValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selector {
    options: Vec<SelectorOption>,
    selected: Option<usize>,
}

impl Selector {
    /// Rebuild from boundary points and their labels.
    ///
    /// The list is `start`, every boundary strictly between the axis start
    /// and the last reachable position, then `end` (the last reachable
    /// position). Values are ascending so lookup can bisect.
    pub(crate) fn rebuild(
        &mut self,
        boundaries: &[(AxisValue, String)],
        start: AxisValue,
        max_position: AxisValue,
    ) {
        let mut options = vec![SelectorOption {
            label: "start".to_string(),
            value: start,
        }];
        for (value, label) in boundaries {
            if value.raw() > start.raw() && value.raw() < max_position.raw() {
                let label = if label.is_empty() { value.to_string() } else { label.clone() };
                options.push(SelectorOption { label, value: *value });
            }
        }
        if max_position.raw() > start.raw() {
            options.push(SelectorOption {
                label: "end".to_string(),
                value: max_position,
            });
        }
        self.options = options;
        self.selected = None;
    }

    /// Select the latest option at or before `position + scale`.
    ///
    /// Returns the new index when the selection changed.
    pub(crate) fn sync(&mut self, position: f64, scale: f64) -> Option<usize> {
        let values: Vec<AxisValue> = self.options.iter().map(|o| o.value).collect();
        let index = latest_at_or_before(&values, position + scale);
        if index == self.selected {
            return None;
        }
        self.selected = index;
        index
    }

    pub fn options(&self) -> &[SelectorOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_option(&self) -> Option<&SelectorOption> {
        self.selected.and_then(|i| self.options.get(i))
    }
}
