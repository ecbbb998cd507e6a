use eframe::egui::{self, Slider};

use crate::{
    mask::{BrushMode, BRUSH_MAX, BRUSH_MIN},
    session::{Busy, SessionEvent},
};

use super::{StudioApp, RESULT_FILE_NAME};

const ICON_SAVE: &str = "\u{1F4BE}";

impl StudioApp {
    pub(super) fn menu(&mut self, ui: &mut egui::Ui) {
        let busy = self.session.busy;

        ui.horizontal(|ui| {
            ui.scope(|ui| {
                if busy != Busy::Idle {
                    ui.disable();
                }
                if ui.button("Open photo\u{2026}").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", &["png", "jpg", "jpeg"])
                        .pick_file()
                    {
                        match std::fs::read(&path) {
                            Ok(bytes) => self.handle_upload(&bytes),
                            Err(e) => {
                                self.file_error =
                                    Some(format!("Could not read {}: {e}", path.display()));
                            }
                        }
                    }
                }
            });

            ui.scope(|ui| {
                if self.session.original.is_none() || busy != Busy::Idle {
                    ui.disable();
                }
                if ui
                    .button("Apply update")
                    .on_hover_text("Send the masked photo and the prompt to the model")
                    .clicked()
                {
                    self.apply();
                }
            });

            ui.scope(|ui| {
                if self.session.result.is_none() || busy != Busy::Idle {
                    ui.disable();
                }
                if ui
                    .button("Smart fix")
                    .on_hover_text("Let the model spot artifacts and propose a corrective prompt")
                    .clicked()
                {
                    self.smart_fix();
                }
            });

            if ui.button("Reset").clicked() {
                self.reset();
            }

            if let Some(result) = &self.session.result {
                if ui.button(ICON_SAVE).on_hover_text("Save result as PNG").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_file_name(RESULT_FILE_NAME)
                        .save_file()
                    {
                        if let Err(e) = std::fs::write(&path, result.as_bytes()) {
                            self.file_error =
                                Some(format!("Could not save {}: {e}", path.display()));
                        }
                    }
                }
            }

            match busy {
                Busy::Idle => {}
                Busy::Suggesting => {
                    ui.spinner();
                    ui.label("Suggesting a prompt\u{2026}");
                }
                Busy::Processing => {
                    ui.spinner();
                    ui.label("Generating\u{2026}");
                }
                Busy::Analyzing => {
                    ui.spinner();
                    ui.label("Analyzing result\u{2026}");
                }
            }
        });

        if self.session.original.is_some() {
            ui.horizontal(|ui| {
                ui.label("Prompt:");
                let mut prompt = self.session.prompt.clone();
                let edit = egui::TextEdit::multiline(&mut prompt)
                    .desired_rows(3)
                    .desired_width(f32::INFINITY);
                if ui.add_enabled(busy != Busy::Suggesting, edit).changed() {
                    self.session.reduce(SessionEvent::PromptEdited(prompt));
                }
            });
        }

        if self.session.result.is_none() {
            if let Some(canvas) = &mut self.canvas {
                ui.horizontal(|ui| {
                    let mut size = canvas.brush.size();
                    if ui
                        .add(Slider::new(&mut size, BRUSH_MIN..=BRUSH_MAX).text("Brush size"))
                        .changed()
                    {
                        canvas.brush.set_size(size);
                    }
                    ui.selectable_value(&mut canvas.brush.mode, BrushMode::Paint, "Paint");
                    ui.selectable_value(&mut canvas.brush.mode, BrushMode::Erase, "Erase");
                });
            }
        }
    }
}
