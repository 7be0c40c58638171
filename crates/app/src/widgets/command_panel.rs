//! Sidebar listing staged commands and the results of the last execution.

use super::drag_drop::DragReorder;
use egui::{Color32, RichText, Sense, TextEdit, Ui};
use session::CommandPanel;

#[derive(Default)]
pub struct CommandPanelUi {
    pub new_command: String,
    pub drag: DragReorder,
}

enum RowEdit {
    Replace(usize, String),
    Delete(usize),
}

/// Draw the panel. Returns true when the user asked to execute. Execution
/// waits while a reply is `streaming`.
pub fn show(
    ui: &mut Ui,
    panel: &mut CommandPanel,
    view: &mut CommandPanelUi,
    streaming: bool,
) -> bool {
    let mut execute = false;
    let executing = panel.is_executing();

    ui.heading("Commands");
    ui.add_space(6.0);

    let mut edit = None;
    // Highlight against last frame's row spans.
    let target = view.drag.hover_target(ui);
    view.drag.begin_frame();

    egui::ScrollArea::vertical()
        .id_source("staged_commands")
        .max_height(ui.available_height() * 0.5)
        .show(ui, |ui| {
            if panel.staging.is_empty() {
                ui.label(RichText::new("Commands from the assistant appear here.").weak());
            }
            for (index, command) in panel.staging.as_slice().iter().enumerate() {
                let highlighted = target == Some(index) && view.drag.dragging() != Some(index);
                let frame = egui::Frame::none()
                    .inner_margin(egui::Margin::symmetric(4.0, 2.0))
                    .stroke(if highlighted {
                        egui::Stroke::new(1.0, Color32::from_rgb(100, 170, 240))
                    } else {
                        egui::Stroke::NONE
                    });
                let row = frame.show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let handle = ui
                            .add(egui::Label::new(RichText::new("☰").weak()).sense(Sense::drag()))
                            .on_hover_cursor(egui::CursorIcon::Grab);
                        let mut text = command.clone();
                        let field = ui.add(
                            TextEdit::singleline(&mut text)
                                .code_editor()
                                .desired_width(ui.available_width() - 60.0),
                        );
                        if field.changed() {
                            edit = Some(RowEdit::Replace(index, text));
                        }
                        if ui.small_button("Copy").clicked() {
                            ui.output_mut(|o| o.copied_text = command.clone());
                        }
                        if ui.small_button("✖").on_hover_text("Remove").clicked() {
                            edit = Some(RowEdit::Delete(index));
                        }
                        handle
                    })
                    .inner
                });
                view.drag.row(index, &row.response, &row.inner);
            }
        });

    match edit {
        Some(RowEdit::Replace(index, text)) => {
            panel.staging.edit(index, text);
        }
        Some(RowEdit::Delete(index)) => {
            panel.staging.delete(index);
            view.drag.cancel();
        }
        None => {}
    }
    if let Some((from, to)) = view.drag.end_frame(ui) {
        panel.staging.reorder(from, to);
    }

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        let response = ui.add(
            TextEdit::singleline(&mut view.new_command)
                .code_editor()
                .hint_text("Add a command")
                .desired_width(ui.available_width() - 50.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (ui.button("Add").clicked() || submitted) && panel.staging.add(&view.new_command) {
            view.new_command.clear();
        }
    });

    ui.add_space(6.0);
    let label = if executing {
        "Executing...".to_string()
    } else {
        format!("Execute ({})", panel.staging.len())
    };
    if ui
        .add_enabled(
            !executing && !streaming && !panel.staging.is_empty(),
            egui::Button::new(label),
        )
        .clicked()
    {
        execute = true;
    }

    ui.separator();
    ui.label(RichText::new("Results").strong());
    egui::ScrollArea::vertical()
        .id_source("command_results")
        .show(ui, |ui| {
            for result in panel.results() {
                let color = if result.success {
                    Color32::from_rgb(90, 180, 110)
                } else {
                    Color32::from_rgb(220, 80, 80)
                };
                ui.label(RichText::new(format!("$ {}", result.command)).monospace().color(color));
                ui.label(RichText::new(result.display_output()).monospace().small());
                ui.add_space(6.0);
            }
        });

    execute
}
