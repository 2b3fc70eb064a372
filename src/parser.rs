use crate::config::OutputFormat;
use crate::error::Error;
use crate::ir::{ColourSpec, FeatureDescriptor, GlyphSpec, GlyphVariant, Segment, Strand, TrackConfig};
use crate::panel::{Panel, PanelConfig};
use crate::viewport::Orientation;
use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

static ATTRIBUTE_SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*;\s*").unwrap());
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^=\s]+)\s*=\s*(.*)$").unwrap());

/// A panel and its tracks as read from an input file, before any clipping.
#[derive(Debug, Clone)]
pub struct PanelDescription {
    pub config: PanelConfig,
    /// Width the input asked for, if any. `config.width` holds the default otherwise.
    pub width: Option<f64>,
    pub tracks: Vec<TrackDescription>,
}

#[derive(Debug, Clone)]
pub struct TrackDescription {
    pub config: TrackConfig,
    pub features: Vec<FeatureDescriptor>,
}

impl PanelDescription {
    pub fn build(self) -> crate::error::Result<Panel> {
        let mut panel = Panel::new(self.config)?;
        let mut dropped = 0usize;
        for track in self.tracks {
            let id = panel.add_track(track.config);
            for feature in track.features {
                if panel.add_feature(id, feature)?.is_none() {
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            debug!("{dropped} features lie outside the display window");
        }
        Ok(panel)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GlyphFile {
    Name(String),
    ByType(BTreeMap<String, String>),
}

impl GlyphFile {
    fn into_spec(self) -> Result<GlyphSpec> {
        match self {
            GlyphFile::Name(name) => GlyphSpec::from_name(&name)
                .ok_or_else(|| Error::config(format!("unknown glyph `{name}`")).into()),
            GlyphFile::ByType(map) => {
                let mut variants = BTreeMap::new();
                for (kind, name) in map {
                    let variant = GlyphVariant::from_name(&name)
                        .ok_or_else(|| Error::config(format!("unknown glyph `{name}`")))?;
                    variants.insert(kind, variant);
                }
                Ok(GlyphSpec::ByType(variants))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SegmentFile {
    Pair([f64; 2]),
    Full {
        #[serde(alias = "start")]
        from: f64,
        #[serde(alias = "stop")]
        to: f64,
        strand: Option<String>,
    },
}

impl SegmentFile {
    fn into_segment(self, default_strand: Strand) -> Result<Segment> {
        match self {
            SegmentFile::Pair([from, to]) => Ok(Segment::new(from, to, default_strand)),
            SegmentFile::Full { from, to, strand } => {
                let strand = match strand {
                    Some(token) => parse_strand(&token)?,
                    None => default_strand,
                };
                Ok(Segment::new(from, to, strand))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubfeatureFile {
    #[serde(rename = "type")]
    kind: String,
    segments: Vec<SegmentFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureFile {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    start: Option<f64>,
    stop: Option<f64>,
    strand: Option<String>,
    #[serde(default)]
    segments: Vec<SegmentFile>,
    #[serde(default)]
    subfeatures: Vec<SubfeatureFile>,
    label: Option<String>,
    link: Option<String>,
    glyph: Option<GlyphFile>,
    #[serde(alias = "color")]
    colour: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackFile {
    #[serde(default)]
    name: String,
    glyph: Option<GlyphFile>,
    #[serde(alias = "color")]
    colour: Option<String>,
    show_label: Option<bool>,
    #[serde(default)]
    features: Vec<FeatureFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PanelFile {
    length: f64,
    width: Option<f64>,
    start: Option<f64>,
    stop: Option<f64>,
    #[serde(default)]
    vertical: bool,
    #[serde(default)]
    clickable: bool,
    format: Option<String>,
    #[serde(default)]
    tracks: Vec<TrackFile>,
}

/// Reads a JSON5 panel description.
pub fn parse_panel_description(input: &str) -> Result<PanelDescription> {
    let parsed: PanelFile = json5::from_str(input).context("invalid panel description")?;

    let mut config = PanelConfig::new(parsed.length);
    if let Some(width) = parsed.width {
        config.width = width;
    }
    config.display_range = display_range(parsed.start, parsed.stop, parsed.length);
    if parsed.vertical {
        config.orientation = Orientation::Vertical;
    }
    config.clickable = parsed.clickable;
    if let Some(format) = parsed.format.as_deref() {
        config.format = OutputFormat::from_name(format)?;
    }

    let mut tracks = Vec::with_capacity(parsed.tracks.len());
    for track in parsed.tracks {
        let mut track_config = TrackConfig::new(track.name);
        if let Some(glyph) = track.glyph {
            track_config.glyph = glyph.into_spec()?;
        }
        if let Some(colour) = track.colour {
            track_config = track_config.with_colour(colour);
        }
        if let Some(show) = track.show_label {
            track_config.show_label = show;
        }
        let features = track
            .features
            .into_iter()
            .map(feature_from_file)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("in track `{}`", track_config.name))?;
        tracks.push(TrackDescription {
            config: track_config,
            features,
        });
    }

    Ok(PanelDescription {
        config,
        width: parsed.width,
        tracks,
    })
}

fn feature_from_file(file: FeatureFile) -> Result<FeatureDescriptor> {
    let strand = match file.strand.as_deref() {
        Some(token) => parse_strand(token)?,
        None => Strand::Forward,
    };
    let mut segments = file
        .segments
        .into_iter()
        .map(|seg| seg.into_segment(strand))
        .collect::<Result<Vec<_>>>()?;
    if segments.is_empty()
        && let (Some(start), Some(stop)) = (file.start, file.stop)
    {
        segments.push(Segment::new(start, stop, strand));
    }

    let mut desc = FeatureDescriptor::new(file.kind.unwrap_or_else(|| "feature".to_string()), segments);
    for sub in file.subfeatures {
        let sub_segments = sub
            .segments
            .into_iter()
            .map(|seg| seg.into_segment(strand))
            .collect::<Result<Vec<_>>>()?;
        desc = desc.with_subfeature(sub.kind, sub_segments);
    }
    if let Some(label) = file.label {
        desc = desc.with_label(label);
    }
    if let Some(link) = file.link {
        desc = desc.with_link(link);
    }
    if let Some(glyph) = file.glyph {
        desc = desc.with_glyph(glyph.into_spec()?);
    }
    if let Some(colour) = file.colour {
        desc = desc.with_colour(ColourSpec::Fixed(colour));
    }
    Ok(desc)
}

fn parse_strand(token: &str) -> Result<Strand> {
    Strand::from_token(token)
        .ok_or_else(|| Error::config(format!("unknown strand `{token}`")).into())
}

fn display_range(start: Option<f64>, stop: Option<f64>, length: f64) -> Option<(f64, f64)> {
    match (start, stop) {
        (None, None) => None,
        (start, stop) => Some((start.unwrap_or(0.0), stop.unwrap_or(length))),
    }
}

struct GffRecord {
    kind: String,
    start: f64,
    stop: f64,
    strand: Strand,
    attributes: HashMap<String, String>,
}

/// Reads GFF3 records. Every feature type gets its own track, in order of
/// first appearance. UTR and CDS records whose `Parent` is an earlier record
/// become typed parts of that record, which then draws as a transcript.
/// Without `length` the domain ends where `##sequence-region` says, or at the
/// largest stop.
pub fn parse_gff(input: &str, length: Option<f64>) -> Result<PanelDescription> {
    let mut records: Vec<GffRecord> = Vec::new();
    let mut region_end: Option<f64> = None;
    for (line_no, line) in input.lines().enumerate() {
        let line = line.trim_end();
        if let Some(region) = line.strip_prefix("##sequence-region") {
            region_end = region
                .split_whitespace()
                .nth(2)
                .and_then(|end| end.parse::<f64>().ok())
                .or(region_end);
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('>') {
            // Embedded FASTA section.
            break;
        }
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 8 {
            warn!("skipping GFF line {}: expected 9 columns, got {}", line_no + 1, columns.len());
            continue;
        }
        let start: f64 = columns[3]
            .trim()
            .parse()
            .with_context(|| format!("bad start on GFF line {}", line_no + 1))?;
        let stop: f64 = columns[4]
            .trim()
            .parse()
            .with_context(|| format!("bad stop on GFF line {}", line_no + 1))?;
        let strand = Strand::from_token(columns[6]).unwrap_or_default();
        records.push(GffRecord {
            kind: columns[2].trim().to_string(),
            start,
            stop,
            strand,
            attributes: parse_attributes(columns.get(8).copied().unwrap_or_default()),
        });
    }

    let length = match length.or(region_end) {
        Some(length) => length,
        None => records.iter().map(|r| r.stop).fold(0.0, f64::max),
    };
    if length <= 0.0 {
        anyhow::bail!("GFF input has no features and no sequence length was given");
    }

    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut features: Vec<(String, FeatureDescriptor)> = Vec::new();
    for record in records {
        if let Some(sub_kind) = part_kind(&record.kind)
            && let Some(parents) = record.attributes.get("Parent")
            && let Some(&idx) = parents.split(',').find_map(|parent| by_id.get(parent.trim()))
        {
            let segment = Segment::new(record.start, record.stop, record.strand);
            let desc = &mut features[idx].1;
            match desc.subfeatures.iter_mut().find(|sub| sub.kind == sub_kind) {
                Some(sub) => sub.segments.push(segment),
                None => desc.subfeatures.push(crate::ir::SubfeatureDescriptor {
                    kind: sub_kind.to_string(),
                    segments: vec![segment],
                }),
            }
            continue;
        }

        let mut desc = FeatureDescriptor::new(
            record.kind.clone(),
            vec![Segment::new(record.start, record.stop, record.strand)],
        );
        if let Some(name) = record.attributes.get("Name").or_else(|| record.attributes.get("ID")) {
            desc = desc.with_label(name.clone());
        }
        if let Some(url) = record.attributes.get("url") {
            desc = desc.with_link(url.clone());
        }
        if let Some(id) = record.attributes.get("ID") {
            by_id.insert(id.clone(), features.len());
        }
        features.push((record.kind, desc));
    }

    let mut tracks: Vec<TrackDescription> = Vec::new();
    for (kind, mut desc) in features {
        if !desc.subfeatures.is_empty() {
            desc.segments.clear();
            desc = desc.with_glyph(GlyphSpec::transcript());
        }
        match tracks.iter_mut().find(|track| track.config.name == kind) {
            Some(track) => track.features.push(desc),
            None => tracks.push(TrackDescription {
                config: TrackConfig::new(kind),
                features: vec![desc],
            }),
        }
    }

    Ok(PanelDescription {
        config: PanelConfig::new(length),
        width: None,
        tracks,
    })
}

fn parse_attributes(column: &str) -> HashMap<String, String> {
    ATTRIBUTE_SEP_RE
        .split(column.trim())
        .filter_map(|pair| ATTRIBUTE_RE.captures(pair))
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .collect()
}

/// Transcript part a GFF type draws as. Other types stay features of their
/// own even when they name a parent.
fn part_kind(gff_type: &str) -> Option<&'static str> {
    match gff_type {
        "five_prime_UTR" | "5'UTR" => Some("utr5"),
        "three_prime_UTR" | "3'UTR" => Some("utr3"),
        "CDS" | "exon" => Some("cds"),
        _ => None,
    }
}
