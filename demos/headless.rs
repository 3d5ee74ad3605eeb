use quakemap::{
    compose, load, Encoding, LayerTrait, MapBuilder, MapVariant, Point, QuakeMapConfig,
    RenderContext, Sources,
};
use anyhow::Context as _;
use quakemap::rendering::DrawCommand;

/// Loads both feeds without a UI and prints what would be drawn.
///
/// `cargo run --example headless -- [basic | tectonic-plates | config.json]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let variant = match std::env::args().nth(1) {
        None => MapVariant::default(),
        Some(arg) if arg.ends_with(".json") => {
            MapVariant::Custom(Box::new(
                QuakeMapConfig::from_json_file(&arg).with_context(|| format!("reading {arg}"))?,
            ))
        }
        Some(arg) => arg.parse()?,
    };
    let config = variant.resolve();

    println!("Earthquake map (headless)");
    println!("=========================");
    println!("Earthquakes: {}", config.feeds.earthquakes);
    if let Some(plates) = &config.feeds.tectonic_plates {
        println!("Plates:      {plates}");
    }

    let mut map = MapBuilder::from_config(config.clone())
        .with_size(Point::new(1024.0, 768.0))
        .build()
        .context("building map")?;
    let encoding = Encoding::from_config(&config)?;
    let sources = Sources::from_config(&config).context("opening feeds")?;

    let data = load(&sources).await;
    let report = compose(&mut map, data, &encoding);

    println!("\nMarkers added:     {}", report.markers_added);
    println!("Features rejected: {}", report.features_rejected);
    match report.plate_paths {
        Some(paths) => println!("Plate boundaries:  {paths} polylines"),
        None => println!("Plate boundaries:  not added"),
    }
    for (feed, error) in &report.failures {
        println!("FAILED {feed}: {error}");
    }

    if let Some(legend) = map.controls().legend() {
        println!("\n{}", legend.legend.title);
        for entry in &legend.legend.entries {
            println!("  {}  {}", entry.color.to_hex(), entry.label);
        }
    }

    if let Some(group) = map.group(quakemap::constants::EARTHQUAKES_LAYER_ID) {
        let strongest = group
            .markers()
            .max_by(|a, b| a.radius().total_cmp(&b.radius()));
        if let Some(marker) = strongest {
            println!("\nLargest marker '{}' (radius {:.1}px)", marker.id(), marker.radius());
            if let Some(text) = marker.popup_text() {
                println!("  {}", text.replace("<br>", " | "));
            }
        }
    }

    if let Some(layer_control) = map.controls().layer_control() {
        println!("\nBase layers: {}", layer_control.base_layer_names().join(", "));
        println!("Overlays:    {}", layer_control.overlay_names().join(", "));
    }

    let mut ctx = RenderContext::new(1024.0, 768.0);
    map.render(&mut ctx)?;
    let (mut tiles, mut lines, mut circles) = (0, 0, 0);
    for cmd in ctx.drawing_queue() {
        match cmd {
            DrawCommand::Tile { .. } => tiles += 1,
            DrawCommand::Line { .. } => lines += 1,
            DrawCommand::Circle { .. } => circles += 1,
        }
    }
    println!("\nFirst frame: {tiles} tiles, {lines} plate lines, {circles} circles");

    Ok(())
}
