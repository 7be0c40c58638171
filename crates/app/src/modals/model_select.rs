use super::{overlay, window, Modal, ModalResult};
use egui::{Context, Id, Key, RichText};
use shared::models::ModelId;

pub struct ModelSelectModal {
    is_open: bool,
    current: ModelId,
    result: ModalResult<ModelId>,
    id: Id,
}

impl ModelSelectModal {
    pub fn new(current: ModelId) -> Self {
        Self {
            is_open: false,
            current,
            result: ModalResult::Pending,
            id: Id::new("model_select_modal"),
        }
    }

    pub fn open_with(&mut self, current: ModelId) {
        self.current = current;
        self.open();
    }

    pub fn take_result(&mut self) -> ModalResult<ModelId> {
        std::mem::replace(&mut self.result, ModalResult::Pending)
    }

    fn choose(&mut self, model: ModelId) {
        self.current = model;
        self.result = ModalResult::Confirmed(model);
        self.is_open = false;
    }
}

impl Modal for ModelSelectModal {
    fn update(&mut self, ctx: &Context) -> bool {
        if !self.is_open {
            return false;
        }

        let mut chosen = None;
        let mut cancel = false;
        overlay(ctx, self.id);
        window("Select a model", self.id).show(ctx, |ui| {
            ui.set_min_width(360.0);
            for &model in ModelId::all() {
                let selected = model == self.current;
                let text = RichText::new(format!("{}  ·  {}", model.display_name(), model.provider()))
                    .strong();
                let response = ui
                    .selectable_label(selected, text)
                    .on_hover_text(model.as_str());
                ui.label(RichText::new(model.description()).small().weak());
                ui.add_space(4.0);
                if response.clicked() {
                    chosen = Some(model);
                }
            }
            ui.add_space(6.0);
            if ui.button("Cancel").clicked() {
                cancel = true;
            }
        });

        if let Some(model) = chosen {
            self.choose(model);
            return true;
        }
        if cancel || ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.close();
            return true;
        }
        false
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn open(&mut self) {
        self.is_open = true;
        self.result = ModalResult::Pending;
    }

    fn close(&mut self) {
        self.is_open = false;
        self.result = ModalResult::Cancelled;
    }
}
