//! # Character Maps (CMap)
//!
//! See [Adobe Tech Note #5411] *ToUnicode Mapping File Tutorial*
//!
//! Every font subset is addressed with one-byte codes. Code `c` selects CID
//! `c + 1` through the shared [`EncodingCMap`], and the per-subset
//! [`ToUnicodeCMap`] maps the same codes back to text.
//!
//! [Adobe Tech Note #5411]: https://pdfa.org/norm-refs/5411.ToUnicode.pdf

use std::{fmt, ops::RangeInclusive};

use smallvec::SmallVec;

/// Range of character that map to sequential unicode characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BFRange {
    /// Character code range
    codes: RangeInclusive<u8>,
    /// Base of mapped unicode code points
    ucs_first: char,
}

impl BFRange {
    /// Create a new [BFRange]
    pub const fn new(codes: RangeInclusive<u8>, ucs_first: char) -> Self {
        Self { codes, ucs_first }
    }

    fn write<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let mut buf = [0; 2];
        let slice = self.ucs_first.encode_utf16(&mut buf);
        write!(out, "<{:02X}> <{:02X}> <", self.codes.start(), self.codes.end())?;
        for utf16char in slice {
            write!(out, "{:04X}", utf16char)?;
        }
        writeln!(out, ">")?;
        Ok(())
    }
}

/// A simple code to unicode character mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BFChar {
    /// Character code
    code: u8,
    /// Mapped unicode code-points
    ucs: SmallVec<[char; 4]>,
}

impl BFChar {
    /// Create a new [BFChar]
    pub fn new(code: u8, ucs: char) -> Self {
        Self {
            code,
            ucs: SmallVec::from_elem(ucs, 1),
        }
    }

    /// Create a new [BFChar] for a ligature or other multi-char text
    pub fn new_slice(code: u8, ucs: &[char]) -> Self {
        Self {
            code,
            ucs: SmallVec::from_slice(ucs),
        }
    }

    fn write<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let mut buf = [0; 2];
        write!(out, "<{:02X}> <", self.code)?;
        for chr in self.ucs.as_slice() {
            let slice = chr.encode_utf16(&mut buf);
            for utf16char in slice {
                write!(out, "{:04X}", utf16char)?;
            }
        }
        writeln!(out, ">")?;
        Ok(())
    }
}

fn bmp(chr: char) -> Option<u32> {
    Some(u32::from(chr)).filter(|&c| c < 0x10000)
}

fn single_bmp(chars: &[char]) -> Option<u32> {
    match chars {
        [chr] => bmp(*chr),
        _ => None,
    }
}

/// An in-memory `ToUnicode` map for one-byte codes
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeCMap {
    bfchars: Vec<BFChar>,
    bfranges: Vec<BFRange>,
}

impl ToUnicodeCMap {
    /// Create a new [ToUnicodeCMap]
    pub fn new(bfchars: Vec<BFChar>, bfranges: Vec<BFRange>) -> Self {
        Self { bfchars, bfranges }
    }

    /// Build the map for a subset, `text[p]` is the text of code `p`
    ///
    /// Codes without text are left unmapped. Runs of consecutive codes that
    /// map to consecutive BMP characters are written as ranges.
    pub fn from_codes<'a>(text: impl IntoIterator<Item = &'a [char]>) -> Self {
        let mut bfchars = vec![];
        let mut bfranges = vec![];

        let mut iter = text
            .into_iter()
            .take(256)
            .enumerate()
            .map(|(code, chars)| (code as u8, chars))
            .peekable();
        while let Some((code, chars)) = iter.next() {
            let chr = match chars {
                [] => continue,
                [chr] if bmp(*chr).is_some() => *chr,
                _ => {
                    bfchars.push(BFChar::new_slice(code, chars));
                    continue;
                }
            };
            let mut end = code;
            let mut chr_last = u32::from(chr);
            // the last byte of a range destination must not carry
            while chr_last & 0xFF != 0xFF
                && iter.peek().and_then(|(_, next)| single_bmp(next)) == Some(chr_last + 1)
            {
                iter.next();
                end += 1;
                chr_last += 1;
            }
            if end > code {
                bfranges.push(BFRange::new(code..=end, chr));
            } else {
                bfchars.push(BFChar::new(code, chr));
            }
        }
        Self::new(bfchars, bfranges)
    }

    /// Write the CMap program
    pub fn write<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "/CIDInit /ProcSet findresource begin")?;
        writeln!(out, "12 dict begin")?;
        writeln!(out, "begincmap")?;
        writeln!(out, "/CIDSystemInfo <<")?;
        writeln!(out, "  /Registry (Adobe)")?;
        writeln!(out, "  /Ordering (UCS)")?;
        writeln!(out, "  /Supplement 0")?;
        writeln!(out, ">> def")?;
        writeln!(out, "/CMapName /Adobe-Identity-UCS def")?;
        writeln!(out, "/CMapType 2 def")?;
        writeln!(out, "1 begincodespacerange")?;
        writeln!(out, "<00> <FF>")?;
        writeln!(out, "endcodespacerange")?;
        for bfchars in self.bfchars.chunks(100) {
            writeln!(out, "{} beginbfchar", bfchars.len())?;
            for bfchar in bfchars {
                bfchar.write(out)?;
            }
            writeln!(out, "endbfchar")?;
        }
        for bfranges in self.bfranges.chunks(100) {
            writeln!(out, "{} beginbfrange", bfranges.len())?;
            for bfrange in bfranges {
                bfrange.write(out)?;
            }
            writeln!(out, "endbfrange")?;
        }
        writeln!(out, "endcmap")?;
        writeln!(out, "CMapName currentdict /CMap defineresource pop")?;
        writeln!(out, "end")?;
        writeln!(out, "end")?;
        Ok(())
    }

    /// Render into a byte buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        // writing into a String does not fail
        let _ = self.write(&mut out);
        out.into_bytes()
    }
}

/// Encoding CMap shared by all subsets: code `c` selects CID `c + 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingCMap {
    capacity: usize,
}

impl EncodingCMap {
    /// Name of the CMap resource
    pub const NAME: &'static str = "PdfForge-OneByte-Identity";

    /// A map for codes `0..capacity`
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.clamp(1, 256),
        }
    }

    /// Write the CMap program
    pub fn write<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "/CIDInit /ProcSet findresource begin")?;
        writeln!(out, "12 dict begin")?;
        writeln!(out, "begincmap")?;
        writeln!(out, "/CIDSystemInfo <<")?;
        writeln!(out, "  /Registry (Adobe)")?;
        writeln!(out, "  /Ordering (Identity)")?;
        writeln!(out, "  /Supplement 0")?;
        writeln!(out, ">> def")?;
        writeln!(out, "/CMapName /{} def", Self::NAME)?;
        writeln!(out, "/CMapType 1 def")?;
        writeln!(out, "1 begincodespacerange")?;
        writeln!(out, "<00> <FF>")?;
        writeln!(out, "endcodespacerange")?;
        writeln!(out, "1 begincidrange")?;
        writeln!(out, "<00> <{:02X}> 1", self.capacity - 1)?;
        writeln!(out, "endcidrange")?;
        writeln!(out, "endcmap")?;
        writeln!(out, "CMapName currentdict /CMap defineresource pop")?;
        writeln!(out, "end")?;
        writeln!(out, "end")?;
        Ok(())
    }

    /// Render into a byte buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        let _ = self.write(&mut out);
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::{BFChar, BFRange, EncodingCMap, ToUnicodeCMap};

    #[test]
    fn test_to_unicode() {
        let text: Vec<&[char]> = vec![&['A'][..], &[][..], &['f', 'i'][..], &['\u{1F600}'][..]];
        let cmap = ToUnicodeCMap::from_codes(text);
        let out = String::from_utf8(cmap.to_bytes()).unwrap();
        assert!(out.contains("<00> <FF>\n"));
        assert!(out.contains("3 beginbfchar\n<00> <0041>\n<02> <00660069>\n<03> <D83DDE00>\n"));
        assert!(!out.contains("<01> <"));
    }

    #[test]
    fn test_coalesce_ranges() {
        let chars: Vec<[char; 1]> = "ABCDxZ\u{FE}\u{FF}\u{100}".chars().map(|c| [c]).collect();
        let mut text: Vec<&[char]> = chars.iter().map(|c| &c[..]).collect();
        text.push(&['f', 'i'][..]);
        let cmap = ToUnicodeCMap::from_codes(text);
        let out = String::from_utf8(cmap.to_bytes()).unwrap();
        assert!(out.contains("2 beginbfrange\n<00> <03> <0041>\n<06> <07> <00FE>\n"));
        assert!(out.contains("4 beginbfchar\n<04> <0078>\n<05> <005A>\n<08> <0100>\n<09> <00660069>\n"));
    }

    #[test]
    fn test_bfrange() {
        let cmap = ToUnicodeCMap::new(vec![BFChar::new(0x20, ' ')], vec![BFRange::new(0x41..=0x5A, 'A')]);
        let out = String::from_utf8(cmap.to_bytes()).unwrap();
        assert!(out.contains("1 beginbfrange\n<41> <5A> <0041>\n"));
    }

    #[test]
    fn test_encoding_cmap() {
        let out = String::from_utf8(EncodingCMap::new(255).to_bytes()).unwrap();
        assert!(out.contains("<00> <FE> 1\n"));
        assert!(out.contains("/CMapType 1 def"));
    }
}
