use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "+" | "1" | "+1" | "forward" => Some(Self::Forward),
            "-" | "-1" | "reverse" | "complement" => Some(Self::Reverse),
            // GFF uses '.' and '?' for unstranded features; they draw like forward ones.
            "." | "?" | "" => Some(Self::Forward),
            _ => None,
        }
    }
}

/// One contiguous sub-interval of a feature (an exon, a UTR, a whole read).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: f64,
    pub to: f64,
    pub strand: Strand,
}

impl Segment {
    pub fn new(from: f64, to: f64, strand: Strand) -> Self {
        Self {
            from: from.min(to),
            to: from.max(to),
            strand,
        }
    }

    pub fn forward(from: f64, to: f64) -> Self {
        Self::new(from, to, Strand::Forward)
    }

    pub fn reverse(from: f64, to: f64) -> Self {
        Self::new(from, to, Strand::Reverse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GlyphVariant {
    Box,
    Generic,
    DirectedBox,
    DirectedGeneric,
    Line,
    LineWithHandles,
    Triangle,
    Dot,
    Spliced,
    DirectedSpliced,
}

impl GlyphVariant {
    pub const ALL: [GlyphVariant; 10] = [
        GlyphVariant::Box,
        GlyphVariant::Generic,
        GlyphVariant::DirectedBox,
        GlyphVariant::DirectedGeneric,
        GlyphVariant::Line,
        GlyphVariant::LineWithHandles,
        GlyphVariant::Triangle,
        GlyphVariant::Dot,
        GlyphVariant::Spliced,
        GlyphVariant::DirectedSpliced,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Generic => "generic",
            Self::DirectedBox => "directed_box",
            Self::DirectedGeneric => "directed_generic",
            Self::Line => "line",
            Self::LineWithHandles => "line_with_handles",
            Self::Triangle => "triangle",
            Self::Dot => "dot",
            Self::Spliced => "spliced",
            Self::DirectedSpliced => "directed_spliced",
        }
    }

    /// Accepts both `directed_box` and `directed-box` spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|variant| variant.name() == normalized)
    }

    /// Undirected counterpart used when an arrowhead cannot be shown. Only the
    /// filled directed glyphs have one.
    pub fn undirected(self) -> Option<Self> {
        match self {
            Self::DirectedGeneric => Some(Self::Generic),
            Self::DirectedSpliced => Some(Self::Spliced),
            _ => None,
        }
    }

    pub fn needs_single_position(self) -> bool {
        matches!(self, Self::Triangle | Self::Dot)
    }
}

impl fmt::Display for GlyphVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Glyph choice for a feature: one variant, or one per subfeature type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum GlyphSpec {
    Single(GlyphVariant),
    ByType(BTreeMap<String, GlyphVariant>),
}

impl GlyphSpec {
    /// Parses a glyph name. `transcript` expands to the UTR/CDS type map.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case("transcript") {
            return Some(Self::transcript());
        }
        GlyphVariant::from_name(name).map(Self::Single)
    }

    pub fn transcript() -> Self {
        let mut map = BTreeMap::new();
        map.insert("utr5".to_string(), GlyphVariant::Box);
        map.insert("utr3".to_string(), GlyphVariant::DirectedBox);
        map.insert("cds".to_string(), GlyphVariant::Spliced);
        Self::ByType(map)
    }

    pub fn resolve(&self, kind: &str) -> GlyphVariant {
        match self {
            Self::Single(variant) => *variant,
            Self::ByType(map) => map.get(kind).copied().unwrap_or(GlyphVariant::Generic),
        }
    }
}

impl Default for GlyphSpec {
    fn default() -> Self {
        Self::Single(GlyphVariant::Generic)
    }
}

pub type ColourFn = Arc<dyn Fn(&FeatureDescriptor) -> String + Send + Sync>;

/// Colour of a feature, or a track's default for its features. A computed
/// colour is evaluated once, when the feature is added to its track.
#[derive(Clone)]
pub enum ColourSpec {
    Fixed(String),
    Computed(ColourFn),
}

impl ColourSpec {
    pub fn computed(f: impl Fn(&FeatureDescriptor) -> String + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    pub fn fixed(&self) -> Option<&str> {
        match self {
            Self::Fixed(colour) => Some(colour),
            Self::Computed(_) => None,
        }
    }

    pub fn resolve(&self, feature: &FeatureDescriptor) -> String {
        match self {
            Self::Fixed(colour) => colour.clone(),
            Self::Computed(f) => f(feature),
        }
    }
}

impl fmt::Debug for ColourSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(colour) => f.debug_tuple("Fixed").field(colour).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubfeatureDescriptor {
    pub kind: String,
    pub segments: Vec<Segment>,
}

/// A feature as handed over by the caller, before clipping.
#[derive(Debug, Clone, Default)]
pub struct FeatureDescriptor {
    pub kind: String,
    pub segments: Vec<Segment>,
    /// Typed parts of a composite feature. When non-empty they replace
    /// `segments` for drawing.
    pub subfeatures: Vec<SubfeatureDescriptor>,
    pub label: Option<String>,
    pub link: Option<String>,
    pub glyph: Option<GlyphSpec>,
    pub colour: Option<ColourSpec>,
}

impl FeatureDescriptor {
    pub fn new(kind: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            kind: kind.into(),
            segments,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        let link = link.into();
        self.link = if link.is_empty() { None } else { Some(link) };
        self
    }

    pub fn with_glyph(mut self, glyph: GlyphSpec) -> Self {
        self.glyph = Some(glyph);
        self
    }

    pub fn with_colour(mut self, colour: ColourSpec) -> Self {
        self.colour = Some(colour);
        self
    }

    pub fn with_subfeature(mut self, kind: impl Into<String>, segments: Vec<Segment>) -> Self {
        self.subfeatures.push(SubfeatureDescriptor {
            kind: kind.into(),
            segments,
        });
        self
    }

    /// All segments, whether given directly or through subfeatures.
    pub fn all_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .chain(self.subfeatures.iter().flat_map(|sub| sub.segments.iter()))
    }

    pub fn extent(&self) -> Option<(f64, f64)> {
        self.all_segments().fold(None, |acc, seg| match acc {
            None => Some((seg.from, seg.to)),
            Some((start, stop)) => Some((start.min(seg.from), stop.max(seg.to))),
        })
    }
}

pub const DEFAULT_TRACK_COLOUR: &str = "#0000FF";

#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub name: String,
    pub glyph: GlyphSpec,
    pub colour: ColourSpec,
    pub show_label: bool,
}

impl TrackConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_glyph(mut self, glyph: GlyphSpec) -> Self {
        self.glyph = glyph;
        self
    }

    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = ColourSpec::Fixed(colour.into());
        self
    }

    /// Colours every feature of the track through `f`, unless the feature
    /// brings its own colour.
    pub fn with_colour_fn(
        mut self,
        f: impl Fn(&FeatureDescriptor) -> String + Send + Sync + 'static,
    ) -> Self {
        self.colour = ColourSpec::computed(f);
        self
    }

    pub fn with_labels(mut self, show_label: bool) -> Self {
        self.show_label = show_label;
        self
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            glyph: GlyphSpec::default(),
            colour: ColourSpec::Fixed(DEFAULT_TRACK_COLOUR.to_string()),
            show_label: true,
        }
    }
}
