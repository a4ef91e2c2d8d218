use crate::compositor::to_rgba8;
use crate::host::Host;
use crate::state::CardState;
use anyhow::{Context, Result};
use std::path::Path;

/// Renders one frame of `state` and writes it to `path` as PNG.
pub fn write_snapshot(host: &mut Host, state: &CardState, path: &Path) -> Result<()> {
    let (w, h) = host.size();
    anyhow::ensure!(w > 0 && h > 0, "snapshot size must be non-zero, got {w}x{h}");
    log::info!(
        "rendering {w}x{h} snapshot (x {:.1}°, y {:.1}°, scale {:.3}, back face: {})",
        state.x_rotation,
        state.y_rotation,
        state.scale,
        state.is_on_back()
    );
    let frame = host.render(state, false);
    to_rgba8(&frame)
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
