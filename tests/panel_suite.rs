use std::path::{Path, PathBuf};

use linmap_renderer::clip::clip_segments;
use linmap_renderer::layout::glyph::Primitive;
use linmap_renderer::parser::{PanelDescription, parse_gff, parse_panel_description};
use linmap_renderer::render::{prepare_output, render_svg};
use linmap_renderer::text_metrics::HeuristicMeasurer;
use linmap_renderer::theme::Theme;
use linmap_renderer::viewport::{flip_for_orientation, unflip_for_orientation};
use linmap_renderer::{
    Error, FeatureDescriptor, GlyphSpec, GlyphVariant, Layout, LayoutConfig, Orientation, OutputFormat,
    Panel, PanelConfig, Segment, TrackConfig, Viewport, compute_layout,
};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn load_description(name: &str) -> PanelDescription {
    let input = std::fs::read_to_string(fixture_path(name)).expect("fixture read failed");
    parse_panel_description(&input).expect("parse failed")
}

fn lay_out(panel: &mut Panel) -> Layout {
    compute_layout(panel, &Theme::classic(), &LayoutConfig::default(), &HeuristicMeasurer)
        .expect("layout failed")
}

fn panel(length: f64, width: f64, window: Option<(f64, f64)>) -> Panel {
    Panel::new(PanelConfig {
        length,
        width,
        display_range: window,
        ..Default::default()
    })
    .expect("panel")
}

fn assert_valid_svg(svg: &str) {
    assert!(svg.starts_with("<svg"), "missing <svg tag");
    assert!(svg.ends_with("</svg>"), "missing </svg tag");
}

#[test]
fn coordinates_map_onto_pixels() {
    let mut panel = panel(1000.0, 500.0, Some((0.0, 1000.0)));
    assert_eq!(panel.viewport().rescale_factor(), 2.0);
    let track = panel.add_track(TrackConfig::new("t"));
    let id = panel
        .add_feature(track, FeatureDescriptor::new("gene", vec![Segment::forward(100.0, 200.0)]))
        .unwrap()
        .unwrap();
    let ranges = panel.feature(id).pixel_ranges();
    assert_eq!(ranges.len(), 1);
    assert_eq!((ranges[0].left, ranges[0].right), (50.0, 100.0));
}

#[test]
fn window_endpoints_map_to_panel_edges() {
    for (window, width) in [((0.0, 1000.0), 500.0), ((250.0, 750.0), 1000.0), ((10.0, 11.0), 7.0)] {
        let viewport = Viewport::new(1000.0, width, Some(window), Orientation::Horizontal, false).unwrap();
        assert!(viewport.genomic_to_pixel(window.0).abs() < 1e-9);
        assert!((viewport.genomic_to_pixel(window.1) - width).abs() < 1e-9);
    }
}

#[test]
fn overlapping_features_share_no_row() {
    let mut panel = panel(1000.0, 1000.0, None);
    let track = panel.add_track(TrackConfig::new("t").with_labels(false));
    let a = panel
        .add_feature(track, FeatureDescriptor::new("gene", vec![Segment::forward(10.0, 50.0)]))
        .unwrap()
        .unwrap();
    let b = panel
        .add_feature(track, FeatureDescriptor::new("gene", vec![Segment::forward(40.0, 90.0)]))
        .unwrap()
        .unwrap();
    let layout = lay_out(&mut panel);
    assert_eq!(layout.feature(a).unwrap().row, 1);
    assert_eq!(layout.feature(b).unwrap().row, 2);
    assert_eq!(panel.track(track).rows_used(), 2);
    assert_eq!(layout.tracks[0].rows_used, 2);
}

#[test]
fn segment_running_past_both_edges_is_chopped() {
    let viewport = Viewport::new(200.0, 100.0, Some((0.0, 100.0)), Orientation::Horizontal, false).unwrap();
    assert_eq!(viewport.rescale_factor(), 1.0);
    let clip = clip_segments(&[Segment::forward(-50.0, 150.0)], &viewport);
    assert_eq!(clip.ranges.len(), 1);
    assert_eq!((clip.ranges[0].left, clip.ranges[0].right), (0.0, 100.0));
    assert!(clip.chopped_at_start);
    assert!(clip.chopped_at_stop);
}

#[test]
fn ranged_feature_with_point_glyph_fails() {
    let mut panel = panel(1000.0, 500.0, None);
    let track = panel.add_track(TrackConfig::new("snps").with_glyph(GlyphSpec::Single(GlyphVariant::Triangle)));
    panel
        .add_feature(track, FeatureDescriptor::new("snp", vec![Segment::forward(30.0, 40.0)]))
        .unwrap();
    let err = compute_layout(&mut panel, &Theme::classic(), &LayoutConfig::default(), &HeuristicMeasurer)
        .unwrap_err();
    assert!(matches!(err, Error::Geometry { variant: GlyphVariant::Triangle, .. }), "{err}");
}

#[test]
fn features_outside_the_window_are_dropped() {
    let mut panel = panel(10_000.0, 400.0, Some((2_000.0, 4_000.0)));
    let track = panel.add_track(TrackConfig::new("t"));
    let before = panel
        .add_feature(track, FeatureDescriptor::new("gene", vec![Segment::forward(100.0, 1_999.0)]))
        .unwrap();
    let after = panel
        .add_feature(track, FeatureDescriptor::new("gene", vec![Segment::forward(4_001.0, 5_000.0)]))
        .unwrap();
    let touching = panel
        .add_feature(track, FeatureDescriptor::new("gene", vec![Segment::forward(1_500.0, 2_000.0)]))
        .unwrap();
    assert!(before.is_none());
    assert!(after.is_none());
    assert!(touching.is_some());
    assert_eq!(panel.track(track).features.len(), 1);
}

#[test]
fn disjoint_features_stay_on_the_first_row() {
    let mut panel = panel(10_000.0, 1_000.0, None);
    let track = panel.add_track(TrackConfig::new("t"));
    let ids: Vec<_> = (0..20)
        .map(|i| {
            let start = i as f64 * 400.0;
            panel
                .add_feature(track, FeatureDescriptor::new("gene", vec![Segment::forward(start, start + 300.0)]))
                .unwrap()
                .unwrap()
        })
        .collect();
    let layout = lay_out(&mut panel);
    for id in ids {
        assert_eq!(layout.feature(id).unwrap().row, 1);
    }
    assert_eq!(layout.tracks[0].rows_used, 1);
}

#[test]
fn rows_never_hold_overlapping_features() {
    let description = load_description("transcripts.json5");
    let mut panel = description.build().unwrap();
    lay_out(&mut panel);
    for track in panel.tracks() {
        for row in 1..=track.grid.occupied_rows() {
            let intervals = track.grid.row(row);
            for (i, a) in intervals.iter().enumerate() {
                for b in &intervals[i + 1..] {
                    assert!(!a.overlaps(b), "track `{}` row {row}: {a:?} overlaps {b:?}", track.name);
                }
            }
        }
    }
}

#[test]
fn fixture_renders_every_track() {
    let description = load_description("transcripts.json5");
    assert!(description.config.clickable);
    let mut panel = description.build().unwrap();
    let layout = lay_out(&mut panel);

    let names: Vec<_> = layout.tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["genes", "transcripts", "variants"]);
    for pair in layout.tracks.windows(2) {
        assert_eq!(pair[0].top + pair[0].height, pair[1].top);
    }
    assert_eq!(layout.tracks[0].top, layout.ruler.height);
    let last = layout.tracks.last().unwrap();
    assert_eq!(layout.height, last.top + last.height);

    // Too narrow for an arrow, and running off the end of the domain.
    let genes = &layout.tracks[0].features;
    assert_eq!(genes[2].glyphs[0].variant, GlyphVariant::Generic);
    assert_eq!(genes[3].glyphs[0].variant, GlyphVariant::Generic);
    assert_eq!(genes[0].glyphs[0].variant, GlyphVariant::DirectedGeneric);

    let transcript = &layout.tracks[1].features[0];
    let variants: Vec<_> = transcript.glyphs.iter().map(|g| g.variant).collect();
    assert_eq!(
        variants,
        vec![GlyphVariant::Box, GlyphVariant::Spliced, GlyphVariant::DirectedBox]
    );

    let snps = &layout.tracks[2].features;
    assert!(snps[1].row > snps[0].row);
    assert!(matches!(snps[0].glyphs[0].primitives[0], Primitive::Triangle { .. }));

    let svg = render_svg(&layout, &Theme::classic());
    assert_valid_svg(&svg);
    for label in ["abcA", "abcB", "abcA-201", "rs100", "genes", "variants"] {
        assert!(svg.contains(&format!(">{label}<")), "missing `{label}`");
    }
}

#[test]
fn clickable_panel_writes_an_image_map() {
    let description = load_description("transcripts.json5");
    let mut panel = description.build().unwrap();
    let layout = lay_out(&mut panel);
    assert_eq!(layout.image_map.elements().len(), 7);

    let rendered = prepare_output(
        &layout,
        &Theme::classic(),
        OutputFormat::Svg,
        Some(Path::new("maps/panel.svg")),
    )
    .unwrap();
    let (path, html) = rendered.html.expect("image map");
    assert_eq!(path, PathBuf::from("maps/panel.html"));
    assert_eq!(html.matches("<area ").count(), 3);
    assert!(html.contains("href=\"https://example.org/tx/abcA-201\""));
    assert!(html.contains("usemap=\"#image_map\""));
}

#[test]
fn vertical_image_map_is_the_rotated_horizontal_one() {
    let horizontal = {
        let mut panel = load_description("transcripts.json5").build().unwrap();
        lay_out(&mut panel)
    };
    let vertical = {
        let mut description = load_description("transcripts.json5");
        description.config.orientation = Orientation::Vertical;
        let mut panel = description.build().unwrap();
        lay_out(&mut panel)
    };
    assert_eq!(vertical.output_size(), (horizontal.height, horizontal.width));
    assert_eq!(vertical.tracks, horizontal.tracks);

    let flat = horizontal.image_map.elements();
    let turned = vertical.image_map.elements();
    assert_eq!(flat.len(), turned.len());
    for (a, b) in flat.iter().zip(turned) {
        assert_eq!(b.rect, flip_for_orientation(a.rect, horizontal.width));
        assert_eq!(unflip_for_orientation(b.rect, horizontal.width), a.rect);
        assert_eq!(a.url, b.url);
    }
    assert!(render_svg(&vertical, &Theme::classic()).contains("rotate(-90)"));
}

#[test]
fn windowed_panel_keeps_partially_visible_features() {
    let mut description = load_description("transcripts.json5");
    description.config.display_range = Some((5_000.0, 10_000.0));
    let mut panel = description.build().unwrap();
    let layout = lay_out(&mut panel);

    let genes = &layout.tracks[0].features;
    assert_eq!(genes.len(), 2);
    let (left, right) = genes[0].extent().unwrap();
    assert_eq!(left, 0.0);
    assert!(right < 600.0);
    assert!(layout.tracks[2].features.is_empty());
    assert_eq!(layout.tracks[2].rows_used, 1);
}

#[test]
fn gff_input_renders() {
    let input = std::fs::read_to_string(fixture_path("sample.gff3")).expect("fixture read failed");
    let description = parse_gff(&input, None).unwrap();
    assert_eq!(description.config.length, 12_000.0);
    let mut panel = description.build().unwrap();
    let layout = lay_out(&mut panel);

    let names: Vec<_> = layout.tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["gene", "mRNA", "SNP"]);
    let genes = &layout.tracks[0].features;
    assert_eq!(genes.len(), 2);
    assert_ne!(genes[0].row, genes[1].row);
    assert_eq!(layout.tracks[1].features[0].glyphs.len(), 3);

    let svg = render_svg(&layout, &Theme::classic());
    assert_valid_svg(&svg);
    assert!(svg.contains(">lmrA-201<"));
    assert!(svg.contains(">rs42<"));
}

#[test]
fn layout_is_repeatable() {
    let mut panel = load_description("transcripts.json5").build().unwrap();
    let first = lay_out(&mut panel);
    let second = lay_out(&mut panel);
    assert_eq!(first, second);
}
