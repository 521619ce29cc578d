// Terrain paint callback

use std::sync::Arc;

use eframe::egui_wgpu::wgpu;
use eframe::{egui, egui_wgpu};
use glam::Mat4;

use crate::terrain::frame::TerrainFrame;

use super::terrain_renderer::TerrainRenderer;

/// Hands one evaluated frame to the [`TerrainRenderer`] stored in the
/// egui_wgpu callback resources.
pub struct TerrainCallback {
    frame: Arc<TerrainFrame>,
    view_proj: Mat4,
}

impl TerrainCallback {
    pub fn new(frame: Arc<TerrainFrame>, view_proj: Mat4) -> Self {
        Self { frame, view_proj }
    }
}

impl egui_wgpu::CallbackTrait for TerrainCallback {
    fn prepare(
        &self,
        _device: &wgpu::Device,
        queue: &wgpu::Queue,
        _screen_descriptor: &egui_wgpu::ScreenDescriptor,
        _egui_encoder: &mut wgpu::CommandEncoder,
        resources: &mut egui_wgpu::CallbackResources,
    ) -> Vec<wgpu::CommandBuffer> {
        if let Some(renderer) = resources.get_mut::<TerrainRenderer>() {
            renderer.upload(queue, &self.frame, self.view_proj);
        } else {
            log::warn!("terrain renderer missing from callback resources");
        }
        Vec::new()
    }

    fn paint(
        &self,
        _info: egui::PaintCallbackInfo,
        render_pass: &mut wgpu::RenderPass<'static>,
        resources: &egui_wgpu::CallbackResources,
    ) {
        if let Some(renderer) = resources.get::<TerrainRenderer>() {
            renderer.render(render_pass);
        }
    }
}
