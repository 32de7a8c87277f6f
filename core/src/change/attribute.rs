use super::Model;

/// Sets or removes one named attribute on a cell's user object.
///
/// A `None` value removes the attribute. The value in effect before the
/// mutation is read back through [`Model::attribute`] and becomes the new
/// `previous`, so removing a missing attribute and setting it back are both
/// expressible.
#[derive(Debug)]
pub struct AttributeChange<M: Model> {
    cell: Option<M::Cell>,
    attribute: String,
    value: Option<String>,
    previous: Option<String>,
}

impl<M: Model> AttributeChange<M> {
    /// Creates a change that sets `attribute` to `value`, or removes it when `value` is `None`.
    pub fn new(cell: M::Cell, attribute: impl Into<String>, value: Option<String>) -> Self {
        Self {
            cell: Some(cell),
            attribute: attribute.into(),
            previous: value.clone(),
            value,
        }
    }

    /// Returns the target cell, unless detached.
    pub fn cell(&self) -> Option<&M::Cell> {
        self.cell.as_ref()
    }

    /// Returns the attribute name.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Returns the value the last execution applied.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the value the next execution applies.
    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub(crate) fn detach(&mut self) {
        self.cell = None;
    }

    /// Swaps the attribute with [`previous`](Self::previous).
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        let Some(cell) = &self.cell else {
            return Ok(());
        };
        let prior = model.attribute(cell, &self.attribute);
        match &self.previous {
            Some(value) => model.set_attribute(cell, &self.attribute, value)?,
            None => model.remove_attribute(cell, &self.attribute)?,
        }
        self.value = std::mem::replace(&mut self.previous, prior);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Node, RecordingModel};

    fn attr(model: &RecordingModel, cell: u32, name: &str) -> Option<String> {
        model.attributes.get(&(Node(cell), name.to_owned())).cloned()
    }

    #[test]
    fn set_then_restore() {
        let mut model = RecordingModel::default();
        model
            .attributes
            .insert((Node(1), "label".into()), "old".into());

        let mut change = AttributeChange::new(Node(1), "label", Some("new".into()));
        change.execute(&mut model).unwrap();
        assert_eq!(attr(&model, 1, "label").as_deref(), Some("new"));
        assert_eq!(change.previous(), Some("old"));

        change.execute(&mut model).unwrap();
        assert_eq!(attr(&model, 1, "label").as_deref(), Some("old"));
        assert_eq!(change.value(), Some("old"));
    }

    #[test]
    fn none_removes_and_second_execute_restores() {
        let mut model = RecordingModel::default();
        model
            .attributes
            .insert((Node(1), "tooltip".into()), "hi".into());

        let mut change = AttributeChange::new(Node(1), "tooltip", None);
        change.execute(&mut model).unwrap();
        assert_eq!(attr(&model, 1, "tooltip"), None);
        assert_eq!(model.calls("remove_attribute"), 1);

        change.execute(&mut model).unwrap();
        assert_eq!(attr(&model, 1, "tooltip").as_deref(), Some("hi"));
        assert_eq!(model.calls("set_attribute"), 1);
    }

    #[test]
    fn adding_a_new_attribute_undoes_to_removal() {
        let mut model = RecordingModel::default();
        let mut change = AttributeChange::new(Node(2), "href", Some("x".into()));
        change.execute(&mut model).unwrap();
        assert_eq!(attr(&model, 2, "href").as_deref(), Some("x"));
        assert_eq!(change.previous(), None);

        change.execute(&mut model).unwrap();
        assert_eq!(attr(&model, 2, "href"), None);
        assert_eq!(change.attribute(), "href");
    }
}
