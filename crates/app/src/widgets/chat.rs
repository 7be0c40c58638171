//! Conversation view and message input.

use crate::markdown::render_markdown;
use egui::{Color32, Id, InputState, Key, Modifiers, RichText, TextEdit, Ui};
use session::Conversation;
use shared::agent_api::Role;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChatAction {
    pub send: bool,
    pub stop: bool,
}

fn bubble_fill(role: Role, dark: bool) -> Color32 {
    match (role, dark) {
        (Role::User, true) => Color32::from_rgb(45, 70, 110),
        (Role::User, false) => Color32::from_rgb(215, 230, 250),
        (_, true) => Color32::from_rgb(50, 50, 58),
        (_, false) => Color32::from_rgb(240, 240, 244),
    }
}

/// Plain Enter submits; Shift+Enter is left to the text edit as a newline.
/// The key is consumed so the edit never inserts it.
fn take_submit_key(input: &mut InputState) -> bool {
    !input.modifiers.shift && input.consume_key(Modifiers::NONE, Key::Enter)
}

/// `executing` blocks sending while staged commands are on their way to
/// the device, so no reply can stage new commands mid-dispatch.
pub fn show(
    ui: &mut Ui,
    conversation: &Conversation,
    input: &mut String,
    streaming: bool,
    executing: bool,
) -> ChatAction {
    let dark = ui.visuals().dark_mode;
    let text_color = if dark {
        Color32::from_rgb(225, 225, 232)
    } else {
        Color32::from_rgb(30, 30, 40)
    };
    let mut action = ChatAction::default();

    let input_height = 84.0;
    let chat_height = (ui.available_height() - input_height).max(100.0);
    let last = conversation.len().saturating_sub(1);

    egui::ScrollArea::vertical()
        .max_height(chat_height)
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for (index, message) in conversation.messages().iter().enumerate() {
                ui.add_space(6.0);
                egui::Frame::none()
                    .fill(bubble_fill(message.role, dark))
                    .rounding(egui::Rounding::same(12.0))
                    .inner_margin(egui::Margin::same(12.0))
                    .show(ui, |ui| {
                        ui.label(RichText::new(message.role.display_name()).strong().small());
                        if streaming && index == last && message.content.is_empty() {
                            let time = ui.input(|i| i.time);
                            let dots = ".".repeat(((time * 2.0) as usize) % 4);
                            ui.label(RichText::new(format!("Thinking{}", dots)).italics().weak());
                        } else {
                            render_markdown(ui, &message.content, text_color);
                        }
                    });
            }
        });

    ui.add_space(8.0);
    let blocked = streaming || executing;
    ui.horizontal(|ui| {
        let input_id = Id::new("chat_input");
        let enter = ui.memory(|m| m.has_focus(input_id)) && ui.input_mut(take_submit_key);
        ui.add(
            TextEdit::multiline(input)
                .id(input_id)
                .desired_rows(3)
                .desired_width(ui.available_width() - 90.0)
                .hint_text("Ask about your Linux system... (Shift+Enter for a new line)"),
        );
        if enter && !blocked {
            action.send = true;
        }

        ui.vertical(|ui| {
            if streaming {
                if ui.button("Stop").clicked() {
                    action.stop = true;
                }
            } else if ui
                .add_enabled(!executing && !input.trim().is_empty(), egui::Button::new("Send"))
                .clicked()
            {
                action.send = true;
            }
        });
    });
    action.send &= !input.trim().is_empty();
    action
}
