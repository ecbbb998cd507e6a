use std::sync::Arc;

use eframe::egui::{self, TextureHandle, TextureOptions};
use log::warn;

use crate::{
    async_task::PendingCall,
    gateway::{GatewayResult, ModelGateway},
    image_utils::PngImage,
    mask::MaskCanvas,
    session::{Busy, Session, SessionEvent},
};

mod menu;

pub(crate) const RESULT_FILE_NAME: &str = "inpaint-studio-result.png";

/// The application shell: owns the session, the canvas and the in-flight
/// gateway calls, and translates UI interaction into reducer events.
pub struct StudioApp {
    session: Session,
    canvas: Option<MaskCanvas>,
    gateway: Arc<dyn ModelGateway>,
    suggest_job: Option<PendingCall<GatewayResult<String>>>,
    inpaint_job: Option<PendingCall<GatewayResult<PngImage>>>,
    analyze_job: Option<PendingCall<GatewayResult<String>>>,
    // Strong reference; the painted image disappears if the handle drops.
    result_texture: Option<TextureHandle>,
    // Sticky per-result decode failure, so a broken payload is reported once
    // rather than re-decoded every frame.
    result_error: Option<String>,
    file_error: Option<String>,
}

impl StudioApp {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            session: Session::default(),
            canvas: None,
            gateway,
            suggest_job: None,
            inpaint_job: None,
            analyze_job: None,
            result_texture: None,
            result_error: None,
            file_error: None,
        }
    }

    /// Feeds finished gateway calls back into the reducer. Replies are tagged
    /// with their issue-time generation; the reducer drops stale ones.
    fn poll_jobs(&mut self) {
        if let Some((generation, result)) = self.suggest_job.as_mut().and_then(PendingCall::poll) {
            self.suggest_job = None;
            self.session
                .reduce(SessionEvent::PromptSuggested { generation, result });
        }
        if let Some((generation, result)) = self.inpaint_job.as_mut().and_then(PendingCall::poll) {
            self.inpaint_job = None;
            self.result_texture = None;
            self.result_error = None;
            self.session
                .reduce(SessionEvent::InpaintFinished { generation, result });
        }
        if let Some((generation, result)) = self.analyze_job.as_mut().and_then(PendingCall::poll) {
            self.analyze_job = None;
            self.session
                .reduce(SessionEvent::AnalysisFinished { generation, result });
        }
    }

    fn handle_upload(&mut self, bytes: &[u8]) {
        let rgba = match image::load_from_memory(bytes) {
            Ok(decoded) => decoded.to_rgba8(),
            Err(e) => {
                self.file_error = Some(format!("Could not decode image: {e}"));
                return;
            }
        };
        let image = match PngImage::from_rgba(&rgba) {
            Ok(image) => image,
            Err(e) => {
                self.file_error = Some(format!("Could not encode image: {e}"));
                return;
            }
        };

        self.file_error = None;
        self.result_texture = None;
        self.result_error = None;
        self.canvas = Some(MaskCanvas::new(Arc::new(rgba)));
        self.session.reduce(SessionEvent::UploadStarted {
            image: image.clone(),
        });
        self.suggest_job = Some(PendingCall::new(
            self.session.generation(),
            self.gateway.suggest_prompt(image),
        ));
    }

    fn apply(&mut self) {
        // Zero completed strokes is legal: the original goes out unmodified.
        let Some(input) = self.session.apply_input().cloned() else {
            return;
        };
        let prompt = self.session.prompt.clone();
        self.session.reduce(SessionEvent::ApplyStarted);
        if self.session.busy == Busy::Processing {
            self.inpaint_job = Some(PendingCall::new(
                self.session.generation(),
                self.gateway.inpaint(input, prompt),
            ));
        }
    }

    fn smart_fix(&mut self) {
        let (Some(original), Some(result)) = (
            self.session.original.clone(),
            self.session.result.clone(),
        ) else {
            return;
        };
        self.session.reduce(SessionEvent::SmartFixStarted);
        if self.session.busy == Busy::Analyzing {
            self.analyze_job = Some(PendingCall::new(
                self.session.generation(),
                self.gateway.analyze_result(original, result),
            ));
        }
    }

    fn reset(&mut self) {
        // In-flight calls are not aborted; the generation bump makes their
        // replies stale.
        self.session.reduce(SessionEvent::Reset);
        self.canvas = None;
        self.result_texture = None;
        self.result_error = None;
        self.file_error = None;
    }

    fn back_to_edit(&mut self) {
        self.session.reduce(SessionEvent::BackToEdit);
        self.result_texture = None;
        self.result_error = None;
    }

    /// Decodes the current result for texture upload, at most once per result:
    /// a failure is remembered in `result_error` and not retried.
    fn decode_result(&mut self) -> Option<egui::ColorImage> {
        if self.result_texture.is_some() || self.result_error.is_some() {
            return None;
        }
        let result = self.session.result.as_ref()?;
        match result.decode() {
            Ok(rgba) => Some(crate::mask::color_image(&rgba)),
            Err(e) => {
                warn!("Result image did not decode: {e}");
                self.result_error = Some(format!("Result image did not decode: {e}"));
                None
            }
        }
    }

    fn result_view(&mut self, ui: &mut egui::Ui) {
        if ui.button("\u{2190} Back to edit").clicked() {
            self.back_to_edit();
            return;
        }
        if let Some(color) = self.decode_result() {
            self.result_texture = Some(ui.ctx().load_texture(
                "result",
                color,
                TextureOptions {
                    magnification: egui::TextureFilter::Nearest,
                    ..Default::default()
                },
            ));
        }
        if let Some(texture) = &self.result_texture {
            let size = texture.size_vec2();
            let scale = (ui.available_width() / size.x).min(1.0);
            ui.image(egui::load::SizedTexture::new(texture.id(), size * scale));
        }
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Inpaint Studio");
            self.menu(ui);

            if let Some(error) = &self.session.error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }
            if let Some(error) = &self.file_error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }
            if let Some(error) = &self.result_error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }

            egui::ScrollArea::both().show(ui, |ui| {
                if self.session.result.is_some() {
                    self.result_view(ui);
                } else if let Some(canvas) = &mut self.canvas {
                    if let Some(composite) = canvas.ui(ui) {
                        self.session
                            .reduce(SessionEvent::MaskUpdated { composite });
                    }
                } else {
                    ui.label("Open a photo of an empty room to start.");
                }
            });
        });

        // Worker threads complete oneshots without waking the UI; keep
        // repainting while a call is in flight so completions are observed.
        if self.session.busy != Busy::Idle {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::ScriptedGateway;

    #[test]
    fn undecodable_result_is_reported_once_and_not_retried() {
        let mut app = StudioApp::new(Arc::new(ScriptedGateway::default()));
        // Valid base64 of bytes that are not a PNG.
        app.session.result = Some(PngImage::from_base64("AQID").unwrap());

        assert!(app.decode_result().is_none());
        let first = app.result_error.clone();
        assert!(first.is_some());

        // The failure sticks; later frames skip the decode instead of
        // logging again.
        assert!(app.decode_result().is_none());
        assert_eq!(app.result_error, first);

        app.back_to_edit();
        assert!(app.result_error.is_none());
        assert!(app.session.result.is_none());
    }

    #[test]
    fn fresh_result_clears_a_previous_decode_failure() {
        let mut app = StudioApp::new(Arc::new(ScriptedGateway::default()));
        app.session.result = Some(PngImage::from_base64("AQID").unwrap());
        assert!(app.decode_result().is_none());
        assert!(app.result_error.is_some());

        app.reset();
        assert!(app.result_error.is_none());
    }
}
