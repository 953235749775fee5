//! End-to-end tests: raw feed frames → display processor → draw commands.
//!
//! Nothing here touches the network; frames are parsed exactly as the
//! connection manager would parse them.

use std::collections::BTreeSet;

use fxmeter::domain::display::Ohlc;
use fxmeter::prelude::*;
use fxmeter::render::NO_DATA_TEXT;

fn feed(processor: &mut DisplayDataProcessor, frames: &[&str]) {
    for frame in frames {
        let kind = Kind::parse(frame).expect("valid frame");
        processor.process(&kind);
    }
}

fn record(processor: &DisplayDataProcessor, symbol: &str) -> SymbolDisplayRecord {
    processor
        .record(&Symbol::from(symbol))
        .cloned()
        .expect("record exists")
}

fn price_texts(frame: &Frame) -> Vec<PriceParts> {
    frame
        .iter()
        .filter_map(|c| match c {
            DrawCommand::PriceText { parts, .. } => Some(parts.clone()),
            _ => None,
        })
        .collect()
}

fn percentage_labels(frame: &Frame) -> BTreeSet<u32> {
    frame
        .texts()
        .filter_map(|t| t.strip_suffix('%'))
        .map(|t| t.parse().expect("numeric percentage"))
        .collect()
}

const USDJPY: &str = r#"{"type":"symbolDataPackage","symbol":"USDJPY","adr":1.0,
    "todaysOpen":155.47,"todaysHigh":155.9,"todaysLow":155.1,"initialPrice":155.47,
    "pipPosition":2,"pipSize":0.01,"pipetteSize":0.001}"#;

const XAUUSD: &str = r#"{"type":"symbolDataPackage","symbol":"XAUUSD","adr":30.0,
    "todaysOpen":2450.0,"todaysHigh":2460.0,"todaysLow":2440.0,"initialPrice":2456.781,
    "pipPosition":1,"pipSize":0.1}"#;

const EURUSD_WIDE: &str = r#"{"type":"symbolDataPackage","symbol":"EURUSD","adr":0.01,
    "todaysOpen":1.085,"todaysHigh":1.093,"todaysLow":1.077,"initialPrice":1.09,
    "pipPosition":4,"pipSize":0.0001}"#;

const EURUSD: &str = r#"{"type":"symbolDataPackage","symbol":"EURUSD","adr":0.01,
    "todaysOpen":1.085,"todaysHigh":1.087,"todaysLow":1.082,"initialPrice":1.0851,
    "pipPosition":4,"pipSize":0.0001}"#;

#[test]
fn test_frame_starts_with_setup_and_clear() {
    let mut processor = DisplayDataProcessor::new();
    feed(&mut processor, &[USDJPY]);

    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(
        Some(&record(&processor, "USDJPY")),
        CanvasSize::new(220.0, 120.0, 2.0),
        VisualizationType::DayRange,
    );

    assert!(matches!(
        frame.commands[0],
        DrawCommand::Setup { backing_width: 440, backing_height: 240, .. }
    ));
    assert!(matches!(frame.commands[1], DrawCommand::Clear { .. }));
    assert!(matches!(frame.commands[2], DrawCommand::FillRect { .. }));
    assert!(frame.placeholder().is_none());
    assert!(frame.is_finite());
}

#[test]
fn test_jpy_labels_drop_padding_zero() {
    let mut processor = DisplayDataProcessor::new();
    feed(&mut processor, &[USDJPY]);

    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(
        Some(&record(&processor, "USDJPY")),
        CanvasSize::new(220.0, 120.0, 1.0),
        VisualizationType::DayRange,
    );

    let texts: Vec<&str> = frame.texts().collect();
    assert!(texts.contains(&"155.47"));
    assert!(!texts.contains(&"155.470"));
    assert!(texts.contains(&"155.9"));

    // The big current-price readout keeps the pipette slot.
    let parts = price_texts(&frame);
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].joined(), "155.470");
    assert_eq!(parts[0].emphasized, "47");
}

#[test]
fn test_gold_shows_pip_position_plus_one_digits() {
    let mut processor = DisplayDataProcessor::new();
    feed(&mut processor, &[XAUUSD]);
    let gold = record(&processor, "XAUUSD");
    assert_eq!(gold.pip.pip_position, 1);
    assert_eq!(format_price(gold.ohlc.current.unwrap(), &gold.pip), "2456.78");

    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(
        Some(&gold),
        CanvasSize::new(220.0, 120.0, 2.0),
        VisualizationType::DayRange,
    );
    let parts = price_texts(&frame);
    assert_eq!(parts[0].joined(), "2456.78");
    assert_eq!(parts[0].emphasized, "6.7");
}

#[test]
fn test_wide_day_discloses_markers_up_to_175() {
    let mut processor = DisplayDataProcessor::new();
    feed(&mut processor, &[EURUSD_WIDE]);

    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(
        Some(&record(&processor, "EURUSD")),
        CanvasSize::new(220.0, 120.0, 2.0),
        VisualizationType::DayRange,
    );

    let expected: BTreeSet<u32> = (1..=7).map(|i| i * 25).collect();
    assert_eq!(percentage_labels(&frame), expected);
    assert!((renderer.disclosure_level() - 1.75).abs() < 1e-12);
    assert!(frame.is_finite());
}

#[test]
fn test_disclosure_grows_with_ticks_and_never_shrinks() {
    let mut processor = DisplayDataProcessor::new();
    feed(&mut processor, &[EURUSD]);

    let mut renderer = DisplayRenderer::default();
    let size = CanvasSize::new(220.0, 120.0, 2.0);

    // 0.005 / 0.01 = 50 % of ADR.
    let frame = renderer.render(Some(&record(&processor, "EURUSD")), size, VisualizationType::DayRange);
    assert_eq!(percentage_labels(&frame), BTreeSet::from([25, 50]));

    // New high stretches the day to 110 % of ADR.
    feed(&mut processor, &[r#"{"type":"tick","symbol":"EURUSD","bid":1.093,"ask":1.0931}"#]);
    let eur = record(&processor, "EURUSD");
    assert_eq!(eur.ohlc.high, Some(1.093));
    let frame = renderer.render(Some(&eur), size, VisualizationType::DayRange);
    assert_eq!(percentage_labels(&frame), BTreeSet::from([25, 50, 75, 100, 125]));
    assert!(frame.texts().any(|t| t == "1.093"));

    // A fresh session snapshot narrows the range, but the display keeps its markers.
    feed(&mut processor, &[EURUSD]);
    let frame = renderer.render(Some(&record(&processor, "EURUSD")), size, VisualizationType::DayRange);
    assert_eq!(percentage_labels(&frame).len(), 5);

    renderer.reset();
    let frame = renderer.render(Some(&record(&processor, "EURUSD")), size, VisualizationType::DayRange);
    assert_eq!(percentage_labels(&frame).len(), 2);
}

#[test]
fn test_partial_snapshot_renders_no_data() {
    let mut processor = DisplayDataProcessor::new();
    feed(
        &mut processor,
        &[r#"{"type":"symbolDataPackage","symbol":"GBPUSD","initialPrice":1.27,"pipPosition":4}"#],
    );

    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(
        Some(&record(&processor, "GBPUSD")),
        CanvasSize::new(220.0, 120.0, 2.0),
        VisualizationType::DayRange,
    );
    assert_eq!(frame.placeholder(), Some(NO_DATA_TEXT));
    assert!(frame.is_finite());
}

#[test]
fn test_snapshot_without_session_prices_renders_no_data() {
    let mut processor = DisplayDataProcessor::new();
    feed(
        &mut processor,
        &[r#"{"type":"symbolDataPackage","symbol":"EURUSD","adr":0.008,
            "projectedAdrHigh":1.089,"projectedAdrLow":1.081,"pipPosition":4}"#],
    );
    let eur = record(&processor, "EURUSD");
    assert_eq!(eur.ohlc, Ohlc::default());

    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(Some(&eur), CanvasSize::new(220.0, 120.0, 2.0), VisualizationType::DayRange);
    assert_eq!(frame.placeholder(), Some(NO_DATA_TEXT));
    assert_eq!(frame.len(), 4);
}

#[test]
fn test_snapshot_without_open_anchors_on_adr_midpoint() {
    let mut processor = DisplayDataProcessor::new();
    feed(
        &mut processor,
        &[r#"{"type":"symbolDataPackage","symbol":"EURUSD","adr":0.01,
            "projectedAdrHigh":1.09,"projectedAdrLow":1.08,"initialPrice":1.0851,"pipPosition":4}"#],
    );

    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(
        Some(&record(&processor, "EURUSD")),
        CanvasSize::new(220.0, 120.0, 2.0),
        VisualizationType::DayRange,
    );
    assert!(frame.placeholder().is_none());
    // High and low collapse onto the price: a zero-range day still shows the first step.
    assert_eq!(percentage_labels(&frame), BTreeSet::from([25]));
    let parts = price_texts(&frame);
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].joined(), "1.08510");
    assert!(frame.is_finite());
}

#[test]
fn test_tiny_adr_renders_no_data_instead_of_flooding_markers() {
    let mut processor = DisplayDataProcessor::new();
    feed(
        &mut processor,
        &[r#"{"type":"symbolDataPackage","symbol":"EURUSD","adr":0.0000001,
            "todaysOpen":1.085,"todaysHigh":1.087,"todaysLow":1.082,"initialPrice":1.0851,
            "pipPosition":4}"#],
    );

    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(
        Some(&record(&processor, "EURUSD")),
        CanvasSize::new(220.0, 120.0, 2.0),
        VisualizationType::DayRange,
    );
    assert_eq!(frame.placeholder(), Some(NO_DATA_TEXT));
    assert_eq!(frame.len(), 4);
    assert_eq!(renderer.disclosure_level(), 0.25);

    // A sane snapshot afterwards draws normally.
    feed(&mut processor, &[EURUSD]);
    let frame = renderer.render(
        Some(&record(&processor, "EURUSD")),
        CanvasSize::new(220.0, 120.0, 2.0),
        VisualizationType::DayRange,
    );
    assert_eq!(percentage_labels(&frame), BTreeSet::from([25, 50]));
}

#[test]
fn test_display_without_record_renders_no_data() {
    let mut renderer = DisplayRenderer::default();
    let frame = renderer.render(None, CanvasSize::new(220.0, 120.0, 2.0), VisualizationType::MarketProfile);
    assert_eq!(frame.placeholder(), Some(NO_DATA_TEXT));
}

#[test]
fn test_tick_for_unknown_symbol_changes_nothing() {
    let mut processor = DisplayDataProcessor::new();
    feed(&mut processor, &[EURUSD]);
    let before = record(&processor, "EURUSD");

    let kind = Kind::parse(r#"{"type":"tick","symbol":"AUDUSD","bid":0.66}"#).unwrap();
    assert!(processor.process(&kind).is_none());
    assert_eq!(processor.len(), 1);
    assert_eq!(record(&processor, "EURUSD"), before);
}

#[test]
fn test_workspace_display_renders_tick_profile() {
    let mut workspace = Workspace::new("pipeline", MemoryStorage::new());
    let id = workspace
        .add_display(Symbol::from("eurusd"), VisualizationType::MarketProfile)
        .unwrap();
    let entry = workspace.get(&id).unwrap().clone();

    let mut processor = DisplayDataProcessor::new();
    feed(&mut processor, &[EURUSD]);
    for bid in ["1.0852", "1.0851", "1.0851", "1.0853"] {
        let tick = format!(r#"{{"type":"tick","symbol":"EURUSD","bid":{bid}}}"#);
        feed(&mut processor, &[tick.as_str()]);
    }

    let config = RenderConfig::default();
    let mut renderer = DisplayRenderer::new(config.clone());
    let frame = renderer.render(
        processor.record(&entry.symbol),
        entry.canvas_size(2.0),
        entry.visualization,
    );

    assert!(frame.placeholder().is_none());
    assert!(frame.is_finite());
    let poc_bars = frame
        .iter()
        .filter(|c| matches!(c, DrawCommand::FillRect { color, .. } if *color == config.poc_color))
        .count();
    assert_eq!(poc_bars, 1);
    assert!(frame.texts().any(|t| t.starts_with("POC ")));

    // Same record as a plain day-range display draws no profile.
    workspace
        .set_visualization(&id, VisualizationType::DayRange)
        .unwrap();
    let entry = workspace.get(&id).unwrap();
    let frame = renderer.render(processor.record(&entry.symbol), entry.canvas_size(2.0), entry.visualization);
    assert!(!frame.texts().any(|t| t.starts_with("POC ")));
}

#[test]
fn test_frame_serializes_for_replay() {
    let mut processor = DisplayDataProcessor::new();
    feed(&mut processor, &[EURUSD]);
    let frame = render_frame(
        &record(&processor, "EURUSD"),
        &RenderConfig::default(),
        CanvasSize::new(220.0, 120.0, 1.0),
        VisualizationType::DayRange,
        0.5,
    );

    let json = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["commands"][0]["op"], "setup");
    let back: Frame = serde_json::from_value(json).unwrap();
    assert_eq!(back.len(), frame.len());
    assert_eq!(back.texts().collect::<Vec<_>>(), frame.texts().collect::<Vec<_>>());
}
