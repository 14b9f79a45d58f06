use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, OnceLock};

use ecow::EcoString;
use rustc_hash::FxHashMap;
use rustybuzz::UnicodeBuffer;
use ttf_parser::{GlyphId, Tag, name_id};

use super::{Font, GlyphAdjustment};
use crate::layout::Abs;

/// An OpenType font at a fixed size.
///
/// Metrics and `kern` pairs come from `ttf-parser`, substitution and
/// positioning from `rustybuzz`. Substituted glyphs are expressed as
/// characters again through a reverse character map.
///
/// Values of this type are cheap to clone.
#[derive(Clone)]
pub struct OpenTypeFont(Arc<Repr>);

/// The internal representation of a font.
struct Repr {
    /// The font's family or full name.
    name: EcoString,
    /// The font size.
    size: Abs,
    /// The number of font units per em.
    units_per_em: f64,
    /// Glyph to character mapping, built on first use.
    reverse_cmap: OnceLock<FxHashMap<u16, char>>,
    /// The underlying ttf-parser face.
    ttf: ttf_parser::Face<'static>,
    /// The underlying rustybuzz face.
    rusty: rustybuzz::Face<'static>,
    // NOTE: `ttf` and `rusty` reference `data`, so `data` must be declared
    // after them to be dropped last.
    /// The raw font data. The allocation must not move, because `ttf` and
    /// `rusty` point into it.
    #[allow(dead_code)]
    data: Arc<[u8]>,
}

impl OpenTypeFont {
    /// Parse a font from data and collection index.
    pub fn new(data: Arc<[u8]>, index: u32, size: Abs) -> Option<Self> {
        // Safety:
        // - The slice's location is stable in memory: the `Arc` keeps the
        //   allocation alive and nobody can move it.
        // - The internal 'static lifetime is not leaked because it is
        //   rewritten to the self-lifetime in `ttf()`.
        let slice: &'static [u8] =
            unsafe { std::slice::from_raw_parts(data.as_ptr(), data.len()) };

        let ttf = ttf_parser::Face::parse(slice, index).ok()?;
        let rusty = rustybuzz::Face::from_slice(slice, index)?;
        let units_per_em = f64::from(ttf.units_per_em());
        let name = ttf
            .names()
            .into_iter()
            .filter(|name| {
                name.name_id == name_id::FULL_NAME || name.name_id == name_id::FAMILY
            })
            .find_map(|name| name.to_string())
            .unwrap_or_default()
            .into();

        Some(Self(Arc::new(Repr {
            name,
            size,
            units_per_em,
            reverse_cmap: OnceLock::new(),
            ttf,
            rusty,
            data,
        })))
    }

    /// A reference to the underlying `ttf-parser` face.
    pub fn ttf(&self) -> &ttf_parser::Face<'_> {
        // We can't implement Deref because that would leak the
        // internal 'static lifetime.
        &self.0.ttf
    }

    /// Convert font units to an absolute length at this font's size.
    fn to_abs(&self, units: impl Into<f64>) -> Abs {
        Abs::from_units(units, self.0.units_per_em, self.0.size)
    }

    /// The horizontal advance of a glyph in font units.
    fn advance(&self, glyph: GlyphId) -> u16 {
        self.ttf().glyph_hor_advance(glyph).unwrap_or(0)
    }

    /// The character a glyph was mapped from, if any.
    fn reverse_cmap(&self) -> &FxHashMap<u16, char> {
        self.0.reverse_cmap.get_or_init(|| {
            let mut map = FxHashMap::default();
            let Some(cmap) = self.ttf().tables().cmap else { return map };
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|cp| {
                    let (Some(c), Some(glyph)) =
                        (char::from_u32(cp), subtable.glyph_index(cp))
                    else {
                        return;
                    };
                    map.entry(glyph.0).or_insert(c);
                });
            }
            map
        })
    }

    /// Shape characters in logical order.
    fn shape(&self, text: &str, script: &str, lang: &str) -> rustybuzz::GlyphBuffer {
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        if let Some(script) = <&[u8; 4]>::try_from(script.as_bytes())
            .ok()
            .and_then(|bytes| rustybuzz::Script::from_iso15924_tag(Tag::from_bytes(bytes)))
        {
            buffer.set_script(script);
        }
        if lang != "dflt" {
            if let Ok(lang) = lang.parse::<rustybuzz::Language>() {
                buffer.set_language(lang);
            }
        }
        buffer.set_direction(rustybuzz::Direction::LeftToRight);
        buffer.guess_segment_properties();
        rustybuzz::shape(&self.0.rusty, &[], buffer)
    }
}

impl Font for OpenTypeFont {
    fn name(&self) -> &str {
        &self.0.name
    }

    fn has_char(&self, c: char) -> bool {
        self.ttf().glyph_index(c).is_some()
    }

    fn char_width(&self, c: char) -> Abs {
        let glyph = self.ttf().glyph_index(c).unwrap_or(GlyphId(0));
        self.to_abs(self.advance(glyph))
    }

    fn has_kerning(&self) -> bool {
        self.ttf().tables().kern.is_some()
    }

    fn kerning(&self, left: char, right: char) -> Abs {
        let ttf = self.ttf();
        let (Some(left), Some(right), Some(kern)) =
            (ttf.glyph_index(left), ttf.glyph_index(right), ttf.tables().kern)
        else {
            return Abs::zero();
        };

        kern.subtables
            .into_iter()
            .filter(|subtable| subtable.horizontal && !subtable.variable)
            .find_map(|subtable| subtable.glyphs_kerning(left, right))
            .map(|units| self.to_abs(units))
            .unwrap_or_default()
    }

    fn performs_substitution(&self) -> bool {
        self.ttf().tables().gsub.is_some()
    }

    fn performs_positioning(&self) -> bool {
        self.ttf().tables().gpos.is_some()
    }

    fn has_positioning_feature(&self, _script: &str, _lang: &str, feature: &str) -> bool {
        let (Some(gpos), Ok(bytes)) =
            (self.ttf().tables().gpos, <&[u8; 4]>::try_from(feature.as_bytes()))
        else {
            return false;
        };
        let tag = Tag::from_bytes(bytes);
        gpos.features.into_iter().any(|f| f.tag == tag)
    }

    fn substitute(&self, text: &[char], script: &str, lang: &str) -> Vec<char> {
        let string: String = text.iter().collect();
        let shaped = self.shape(&string, script, lang);
        let reverse = self.reverse_cmap();
        shaped
            .glyph_infos()
            .iter()
            .filter_map(|info| {
                let glyph = u16::try_from(info.glyph_id).ok()?;
                reverse
                    .get(&glyph)
                    .copied()
                    .or_else(|| string[info.cluster as usize..].chars().next())
            })
            .collect()
    }

    fn position(&self, text: &[char], script: &str, lang: &str) -> Option<Vec<GlyphAdjustment>> {
        let string: String = text.iter().collect();
        let shaped = self.shape(&string, script, lang);
        if shaped.len() != text.len() {
            return None;
        }

        let adjustments = shaped
            .glyph_infos()
            .iter()
            .zip(shaped.glyph_positions())
            .map(|(info, pos)| {
                let glyph = GlyphId(u16::try_from(info.glyph_id).unwrap_or(0));
                let nominal = i32::from(self.advance(glyph));
                GlyphAdjustment {
                    x_placement: self.to_abs(pos.x_offset),
                    y_placement: self.to_abs(pos.y_offset),
                    x_advance: self.to_abs(pos.x_advance - nominal),
                    y_advance: self.to_abs(pos.y_advance),
                }
            })
            .collect();

        Some(adjustments)
    }
}

impl Debug for OpenTypeFont {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "OpenTypeFont({}, {:?})", self.0.name, self.0.size)
    }
}
