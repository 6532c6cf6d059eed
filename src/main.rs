mod surfaces;

use std::sync::Arc;

use anyhow::{Context, Result};
use backdrop_core::{Config, ConfigError};
use backdrop_geo::{ConfiguredPosition, GeolocationLookup, HttpGeocoder};
use backdrop_view::{PageOptions, PageView, Surfaces, Viewport};

use crate::surfaces::{DownloadSurface, StatusLine};

#[tokio::main]
async fn main() -> Result<()> {
    backdrop_core::init()?;

    let (config, _) = Config::load_validated().inspect_err(|e| {
        if let Some(config_error) = e.downcast_ref::<ConfigError>() {
            tracing::error!("{}", config_error.user_message());
        }
    })?;

    let status = StatusLine::new();
    let surfaces = Surfaces {
        image: Arc::new(DownloadSurface::new(config.display.image_path.clone())?),
        time: Arc::new(status.time()),
        location: Arc::new(status.location()),
    };

    let provider = ConfiguredPosition::from_config(&config.geolocation)
        .context("Failed to set up geolocation")?;
    let geocoder =
        HttpGeocoder::from_config(&config.geocode).context("Failed to set up geocoder")?;
    let lookup = GeolocationLookup::new(provider, geocoder, config.geocode.timeout());

    let viewport = Viewport::new(
        config.display.viewport_width,
        config.display.viewport_height,
    );
    let revealed = PageView::new(PageOptions::from_config(&config), surfaces)
        .load(viewport, lookup)
        .await;

    tracing::info!("Backdrop revealed {}", revealed.source);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    println!();
    tracing::info!("Backdrop stopped");

    Ok(())
}
