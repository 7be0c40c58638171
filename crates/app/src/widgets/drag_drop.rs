//! Drag-to-reorder for the rows of a vertical list.
//!
//! Rows register their screen span each frame; a drag started on a row's
//! handle ends on whichever row the pointer is released over.

use egui::{Rangef, Response, Ui};

#[derive(Debug, Default)]
pub struct DragReorder {
    dragging: Option<usize>,
    rows: Vec<Rangef>,
}

impl DragReorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Call before laying out the rows of this frame.
    pub fn begin_frame(&mut self) {
        self.rows.clear();
    }

    /// Register row `index` and its drag `handle`.
    pub fn row(&mut self, index: usize, row: &Response, handle: &Response) {
        if self.rows.len() <= index {
            self.rows.resize(index + 1, Rangef::NOTHING);
        }
        self.rows[index] = row.rect.y_range();
        if handle.drag_started() {
            self.dragging = Some(index);
        }
    }

    /// Row the pointer would drop onto.
    pub fn hover_target(&self, ui: &Ui) -> Option<usize> {
        self.dragging?;
        let y = ui.input(|i| i.pointer.hover_pos())?.y;
        drop_index(y, &self.rows)
    }

    /// After the rows: `Some((from, to))` when a drag was released this frame.
    pub fn end_frame(&mut self, ui: &Ui) -> Option<(usize, usize)> {
        let from = self.dragging?;
        if !ui.input(|i| i.pointer.any_released()) {
            return None;
        }
        let to = self.hover_target(ui);
        self.dragging = None;
        to.filter(|&to| to != from).map(|to| (from, to))
    }

    pub fn cancel(&mut self) {
        self.dragging = None;
    }
}

/// Index of the row containing `y`; above the first row is 0 and below
/// the last row is the last index.
pub fn drop_index(y: f32, rows: &[Rangef]) -> Option<usize> {
    if rows.is_empty() {
        return None;
    }
    rows.iter()
        .position(|span| y <= span.max)
        .or(Some(rows.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Rangef> {
        vec![
            Rangef::new(0.0, 20.0),
            Rangef::new(24.0, 44.0),
            Rangef::new(48.0, 68.0),
        ]
    }

    #[test]
    fn test_drop_index_inside_rows() {
        assert_eq!(drop_index(10.0, &rows()), Some(0));
        assert_eq!(drop_index(30.0, &rows()), Some(1));
        assert_eq!(drop_index(60.0, &rows()), Some(2));
    }

    #[test]
    fn test_drop_index_clamps_outside() {
        assert_eq!(drop_index(-40.0, &rows()), Some(0));
        assert_eq!(drop_index(500.0, &rows()), Some(2));
        assert_eq!(drop_index(10.0, &[]), None);
    }

    #[test]
    fn test_gap_between_rows_goes_to_next() {
        assert_eq!(drop_index(22.0, &rows()), Some(1));
    }

    #[test]
    fn test_new_has_no_drag() {
        let drag = DragReorder::new();
        assert_eq!(drag.dragging(), None);
    }
}
