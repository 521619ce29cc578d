use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui_wgpu;
use egui::{Color32, Sense};

use crate::clock::Tick;
use crate::gpu::{Camera, TerrainCallback, TerrainRenderer};
use crate::params::{ParamKey, ParamKind, ParamValue, SchemaVersion};
use crate::session::TerrainSession;
use crate::terrain::color_map::Rgb;

pub struct TopographicApp {
    session: TerrainSession,
    camera: Camera,
    /// Hex text being edited, per color field.
    hex_inputs: HashMap<ParamKey, String>,
    status: Option<String>,
    gpu_available: bool,
}

impl Default for TopographicApp {
    fn default() -> Self {
        let session = TerrainSession::default();
        let hex_inputs = ParamKey::ALL
            .into_iter()
            .filter_map(|key| match session.store().get(key) {
                ParamValue::Color(color) => Some((key, color.to_hex())),
                _ => None,
            })
            .collect();
        Self {
            session,
            camera: Camera::default(),
            hex_inputs,
            status: None,
            gpu_available: false,
        }
    }
}

impl TopographicApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self::default();
        if let Some(render_state) = cc.wgpu_render_state.as_ref() {
            let renderer = TerrainRenderer::new(
                &render_state.device,
                render_state.target_format,
                app.session.grid(),
            );
            render_state
                .renderer
                .write()
                .callback_resources
                .insert(renderer);
            app.gpu_available = true;
        } else {
            log::error!("wgpu render state unavailable, terrain will not be drawn");
        }
        app
    }

    fn randomize(&mut self) {
        self.session.randomize(&mut rand::rng());
    }

    fn report(&mut self, result: Result<(), crate::error::ParamError>) {
        match result {
            Ok(()) => self.status = None,
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn bool_toggle(&mut self, ui: &mut egui::Ui, key: ParamKey) {
        if let ParamValue::Bool(mut on) = self.session.store().get(key) {
            if ui.checkbox(&mut on, key.label()).changed() {
                let result = self.session.set(key, on);
                self.report(result);
            }
        }
    }

    fn float_slider(&mut self, ui: &mut egui::Ui, key: ParamKey) {
        let (Some((range, step)), ParamValue::Float(mut value)) =
            (key.ui_range(), self.session.store().get(key))
        else {
            return;
        };
        if ui
            .add(egui::Slider::new(&mut value, range).step_by(step).text(key.label()))
            .changed()
        {
            let result = self.session.set(key, value);
            self.report(result);
        }
    }

    fn color_row(&mut self, ui: &mut egui::Ui, key: ParamKey) {
        let ParamValue::Color(color) = self.session.store().get(key) else {
            return;
        };
        // Stored channels are sRGB-encoded, as egui's picker expects.
        let mut picked = color.to_rgb8();
        let mut submitted = None;
        ui.horizontal(|ui| {
            if ui.color_edit_button_srgb(&mut picked).changed() {
                submitted = Some(Rgb::from(picked).to_hex());
            }
            let text = self
                .hex_inputs
                .entry(key)
                .or_insert_with(|| color.to_hex());
            let response = ui.add(egui::TextEdit::singleline(text).desired_width(64.0));
            if response.lost_focus() && submitted.is_none() && *text != color.to_hex() {
                submitted = Some(text.clone());
            }
            ui.label(key.label());
        });

        if let Some(hex) = submitted {
            let result = self.session.set_color_hex(key, &hex);
            if let ParamValue::Color(current) = self.session.store().get(key) {
                if result.is_ok() {
                    self.hex_inputs.insert(key, current.to_hex());
                }
            }
            self.report(result);
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Terrain");
        self.bool_toggle(ui, ParamKey::TransformTo2D);

        let mut schema = self.session.params().schema;
        egui::ComboBox::from_label("Schema")
            .selected_text(format!("{schema:?}"))
            .show_ui(ui, |ui| {
                for version in SchemaVersion::ALL {
                    ui.selectable_value(&mut schema, version, format!("{version:?}"));
                }
            });
        if schema != self.session.params().schema {
            let result = self.session.update(|params| params.schema = schema);
            self.report(result);
        }

        ui.separator();
        for key in ParamKey::ALL {
            if key.kind() == ParamKind::Float {
                self.float_slider(ui, key);
            }
        }

        if ui.button("Randomize").on_hover_text("Ctrl+R").clicked() {
            self.randomize();
        }

        ui.separator();
        ui.heading("Colors");
        self.bool_toggle(ui, ParamKey::ElevationColorMode);
        self.bool_toggle(ui, ParamKey::LineColorMode);
        for key in [
            ParamKey::LowColor,
            ParamKey::HighColor,
            ParamKey::LineColor,
            ParamKey::BackgroundColor,
        ] {
            self.color_row(ui, key);
        }

        if let Some(status) = &self.status {
            ui.colored_label(Color32::LIGHT_RED, status);
        }

        ui.separator();
        ui.label(format!(
            "t = {:.2}s | frame {} | revision {}",
            self.session.clock().elapsed(),
            self.session.clock().frame_count(),
            self.session.store().revision()
        ));
    }
}

impl eframe::App for TopographicApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls")
            .resizable(false)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.controls(ui));
            });

        if ctx.input(|i| {
            i.key_pressed(egui::Key::R) && i.modifiers.matches_logically(egui::Modifiers::CTRL)
        }) {
            self.randomize();
        }

        let time = ctx.input(|i| i.time);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, _response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
                let background = self.session.params().background_color;
                ui.painter().rect_filled(rect, 0.0, Color32::from(background));

                let frame = Arc::new(self.session.tick(Tick::Absolute(time)));
                if !self.gpu_available {
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "wgpu backend required",
                        egui::FontId::proportional(16.0),
                        Color32::GRAY,
                    );
                    return;
                }
                let view_proj = self.camera.view_proj(rect.width() / rect.height());
                ui.painter().add(egui_wgpu::Callback::new_paint_callback(
                    rect,
                    TerrainCallback::new(frame, view_proj),
                ));
            });

        ctx.request_repaint();
    }
}
