use anyhow::Context as _;
use quakemap::{
    compose, load, CompositionReport, Encoding, LoadedData, Map, MapBuilder, MapVariant,
    QuakeMapConfig, QuakeMapWidget, Sources,
};
use quakemap::data::UsgsFeed;
use std::time::Duration;
use tokio::sync::oneshot;

const USAGE: &str = "usage: quakemap-app [--basic | --variant <basic|tectonic-plates>] \
                     [--feed <all_week|4.5_day|...>] [config.json]";

/// Desktop viewer: builds the map, loads both feeds in the background and
/// composes them once they arrive
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = config_from_args(std::env::args().skip(1))?;
    let map = MapBuilder::from_config(config.clone())
        .build()
        .context("building map")?;
    let encoding = Encoding::from_config(&config).context("reading encoding")?;
    let sources = Sources::from_config(&config).context("opening feeds")?;

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let data = load(&sources).await;
        let _ = tx.send(data);
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Earthquakes"),
        ..Default::default()
    };

    let cache_size = config.base_layers.cache_size;
    eframe::run_native(
        "quakemap-app",
        options,
        Box::new(move |_cc| Box::new(QuakeMapApp::new(map, encoding, rx, cache_size))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))?;

    Ok(())
}

fn config_from_args(args: impl Iterator<Item = String>) -> anyhow::Result<QuakeMapConfig> {
    let mut variant = MapVariant::default();
    let mut feed: Option<UsgsFeed> = None;
    let mut args = args;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--basic" => variant = MapVariant::Basic,
            "--variant" => {
                let name = args.next().context(USAGE)?;
                variant = name.parse()?;
            }
            "--feed" => {
                let name = args.next().context(USAGE)?;
                feed = Some(name.parse()?);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            path => {
                let config = QuakeMapConfig::from_json_file(path)
                    .with_context(|| format!("reading config {path}"))?;
                variant = MapVariant::Custom(Box::new(config));
            }
        }
    }

    let mut config = variant.resolve();
    if let Some(feed) = feed {
        config.feeds.earthquakes = feed.url();
    }
    Ok(config)
}

struct QuakeMapApp {
    map: Map,
    widget: QuakeMapWidget,
    encoding: Encoding,
    pending: Option<oneshot::Receiver<LoadedData>>,
    report: Option<CompositionReport>,
}

impl QuakeMapApp {
    fn new(
        map: Map,
        encoding: Encoding,
        pending: oneshot::Receiver<LoadedData>,
        cache_size: usize,
    ) -> Self {
        Self {
            map,
            widget: QuakeMapWidget::new(cache_size),
            encoding,
            pending: Some(pending),
            report: None,
        }
    }

    /// Composes the feeds once, as soon as the background load finishes
    fn poll_feeds(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(data) => {
                self.report = Some(compose(&mut self.map, data, &self.encoding));
                self.pending = None;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                log::error!("feed loader stopped before delivering data");
                self.pending = None;
            }
        }
    }

    fn status_line(&self) -> String {
        match &self.report {
            None if self.pending.is_some() => "Loading earthquakes...".to_string(),
            None => "Feeds unavailable".to_string(),
            Some(report) => {
                let mut status = format!("{} earthquakes", report.markers_added);
                if report.features_rejected > 0 {
                    status.push_str(&format!(", {} skipped", report.features_rejected));
                }
                for (feed, error) in &report.failures {
                    status.push_str(&format!(" | {feed} failed: {error}"));
                }
                status
            }
        }
    }
}

impl eframe::App for QuakeMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_feeds();
        if self.pending.is_some() {
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_line());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let viewport = self.map.viewport();
                    ui.label(format!(
                        "Center: {:.4}, {:.4} | Zoom: {:.2}",
                        viewport.center.lat, viewport.center.lng, viewport.zoom
                    ));
                });
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.widget.show(ui, &mut self.map);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_default_args_use_plates_variant() {
        let config = config_from_args(args(&[])).unwrap();
        assert!(config.feeds.tectonic_plates.is_some());
        assert!(config.layer_control);
    }

    #[test]
    fn test_basic_with_feed_override() {
        let config = config_from_args(args(&["--basic", "--feed", "4.5_day"])).unwrap();
        assert!(config.feeds.tectonic_plates.is_none());
        assert!(config.feeds.earthquakes.ends_with("4.5_day.geojson"));
    }

    #[test]
    fn test_unknown_variant_is_an_error() {
        assert!(config_from_args(args(&["--variant", "heatmap"])).is_err());
    }
}
