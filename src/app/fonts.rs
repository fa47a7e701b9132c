use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use eframe::egui::{Context, FontData, FontDefinitions, FontFamily};
use tracing::info;

use service_graph::graph::ICON_FONT_FAMILY;

pub(super) fn install_icon_font(ctx: &Context, path: &Path) -> Result<()> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read icon font {}", path.display()))?;

    let mut fonts = FontDefinitions::default();
    fonts.font_data.insert(
        ICON_FONT_FAMILY.to_owned(),
        Arc::new(FontData::from_owned(bytes)),
    );
    fonts.families.insert(
        FontFamily::Name(ICON_FONT_FAMILY.into()),
        vec![ICON_FONT_FAMILY.to_owned()],
    );
    ctx.set_fonts(fonts);

    info!(path = %path.display(), "icon font installed");
    Ok(())
}
