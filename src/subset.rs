//! Partitioning of used glyphs into one-byte subsets

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::font::GlyphId;

/// One-byte codes available after reserving glyph 0 for `.notdef`
pub const DEFAULT_CAPACITY: usize = 255;

/// Where a glyph ended up
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubsetGlyph {
    /// Index of the subset (one font resource per subset)
    pub subset: usize,
    /// The one-byte character code within that subset
    pub position: u8,
}

/// The glyphs of one subset, in code order
#[derive(Debug, Clone, Default)]
pub struct Subset {
    glyphs: Vec<GlyphId>,
    unicode: Vec<SmallVec<[char; 1]>>,
}

impl Subset {
    /// The assigned glyphs, `glyphs()[p]` is shown for code `p`
    pub fn glyphs(&self) -> &[GlyphId] {
        &self.glyphs
    }

    /// Text that the glyph at `position` represents
    pub fn unicode(&self, position: usize) -> &[char] {
        self.unicode
            .get(position)
            .map(|u| u.as_slice())
            .unwrap_or(&[])
    }

    /// Number of assigned glyphs
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether nothing was assigned yet
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// All `capacity` slots, unassigned ones are `None` (`.notdef`)
    pub fn padded_glyphs(&self, capacity: usize) -> impl Iterator<Item = Option<GlyphId>> + '_ {
        let fill = capacity.saturating_sub(self.glyphs.len());
        self.glyphs
            .iter()
            .copied()
            .map(Some)
            .chain(std::iter::repeat(None).take(fill))
    }
}

/// Assigns glyphs of a single font to `(subset, position)` pairs
#[derive(Debug, Clone)]
pub struct FontSubsetter {
    capacity: usize,
    assigned: HashMap<GlyphId, SubsetGlyph>,
    subsets: Vec<Subset>,
}

impl Default for FontSubsetter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl FontSubsetter {
    /// Create a subsetter, `capacity` is clamped to `1..=255`
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.clamp(1, DEFAULT_CAPACITY),
            assigned: HashMap::new(),
            subsets: Vec::new(),
        }
    }

    /// Number of codes per subset
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a glyph without assigning it
    pub fn get(&self, glyph: GlyphId) -> Option<SubsetGlyph> {
        self.assigned.get(&glyph).copied()
    }

    /// Assign a glyph, returning the existing slot if it already has one
    ///
    /// The flag is `true` if this call opened a new subset.
    pub fn assign(&mut self, glyph: GlyphId, unicode: Option<char>) -> (SubsetGlyph, bool) {
        if let Some(slot) = self.assigned.get(&glyph).copied() {
            if let Some(chr) = unicode {
                let text = &mut self.subsets[slot.subset].unicode[slot.position as usize];
                if text.is_empty() {
                    text.push(chr);
                }
            }
            return (slot, false);
        }

        let opened = match self.subsets.last() {
            Some(last) => last.len() >= self.capacity,
            None => true,
        };
        if opened {
            self.subsets.push(Subset::default());
        }
        let subset = self.subsets.len() - 1;
        let current = &mut self.subsets[subset];
        let slot = SubsetGlyph {
            subset,
            position: current.glyphs.len() as u8,
        };
        current.glyphs.push(glyph);
        current.unicode.push(unicode.into_iter().collect());
        self.assigned.insert(glyph, slot);
        (slot, opened)
    }

    /// All subsets opened so far, each one non-empty
    pub fn subsets(&self) -> &[Subset] {
        &self.subsets
    }

    /// A single subset
    pub fn subset(&self, index: usize) -> Option<&Subset> {
        self.subsets.get(index)
    }
}
