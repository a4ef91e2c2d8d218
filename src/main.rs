use anyhow::Result;
use blurcard::assets::Assets;
use blurcard::card::CardView;
use blurcard::config::Args;
use blurcard::host::Host;
use blurcard::logging::{init_logging, LoggingConfig};
use blurcard::snapshot::write_snapshot;
use blurcard::state::CardState;
use blurcard::terminal;
use blurcard::widget::{self, CardWidget};
use clap::Parser;

/// Main function
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig {
        env_filter: args.log_filter.clone(),
        file: args.log_file.clone(),
    })?;

    let card = CardView::new(Assets::load(&args.assets));

    if let Some(path) = &args.snapshot {
        let mut host = Host::new(card, args.width, args.height);
        let state = CardState {
            x_rotation: args.rotate_x,
            y_rotation: args.rotate_y,
            scale: args.scale,
        };
        return write_snapshot(&mut host, &state, path);
    }

    let (cols, rows) = terminal::size();
    let (width, height) = terminal::surface_size(cols, rows, widget::STATUS_ROWS);
    log::info!("starting interactive mode on a {cols}x{rows} terminal");
    let mut card_widget = CardWidget::new(Host::new(card, width, height), args.debug);
    widget::run(&mut card_widget)?;
    log::info!("exiting interactive mode");
    log::debug!("final card state: {:?}", card_widget.controller().target());
    Ok(())
}
