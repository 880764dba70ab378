// src/ui/panel.rs
//! Light-rig settings panel

use crate::config::Tunables;
use crate::gfx::scene::SceneStatistics;

pub const EXPOSURE_RANGE: (f32, f32) = (0.0, 1.0);
pub const BULB_POWER_RANGE: (f32, f32) = (0.0, 3000.0);
pub const SKY_IRRADIANCE_RANGE: (f32, f32) = (0.0, 1.0);

/// Read-only numbers shown under the controls
#[derive(Debug)]
pub struct PanelInfo {
    pub stats: SceneStatistics,
    pub pending_textures: usize,
    pub frame_rate: f32,
}

/// Draws the "Light Rig" window, returns `true` when a value changed
///
/// Values are written straight into `tunables`; the animation driver picks
/// them up on the next frame.
pub fn light_rig_panel(ui: &imgui::Ui, tunables: &mut Tunables, info: Option<&PanelInfo>) -> bool {
    let display_size = ui.io().display_size;
    // Guard against invalid display size that could cause crashes
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return false;
    }

    let mut changed = false;
    ui.window("Light Rig")
        .size([340.0, 0.0], imgui::Condition::FirstUseEver)
        .position([display_size[0] - 360.0, 20.0], imgui::Condition::FirstUseEver)
        .always_auto_resize(true)
        .collapsible(true)
        .build(|| {
            changed |= ui.checkbox("shadows", &mut tunables.shadows_enabled);
            changed |= ui.slider(
                "exposure",
                EXPOSURE_RANGE.0,
                EXPOSURE_RANGE.1,
                &mut tunables.exposure,
            );
            changed |= ui.slider(
                "bulb power",
                BULB_POWER_RANGE.0,
                BULB_POWER_RANGE.1,
                &mut tunables.bulb_power,
            );
            changed |= ui.slider(
                "sky irradiance",
                SKY_IRRADIANCE_RANGE.0,
                SKY_IRRADIANCE_RANGE.1,
                &mut tunables.sky_irradiance,
            );

            if ui.button("Reset") {
                *tunables = Tunables::default();
                changed = true;
            }

            if let Some(info) = info {
                ui.separator();
                render_stats(ui, info);
            }
        });

    changed
}

fn render_stats(ui: &imgui::Ui, info: &PanelInfo) {
    ui.text(format!("{:.0} fps", info.frame_rate));
    ui.text(format!(
        "{} objects, {} triangles",
        info.stats.object_count, info.stats.total_triangles
    ));
    ui.text(format!("{} flakes", info.stats.flake_count));
    if info.pending_textures > 0 {
        ui.text_colored(
            [1.0, 0.8, 0.3, 1.0],
            format!("loading {} textures", info.pending_textures),
        );
    }
}
