//! Methods to produce a binary file

use std::io::{self, Write};

use chrono::{DateTime, FixedOffset};

use crate::{
    common::{ObjRef, PdfString},
    util::ByteCounter,
};

/// API to serialize a dict
#[must_use]
pub struct PdfDict<'a, 'b> {
    first: bool,
    f: &'b mut Formatter<'a>,
}

impl PdfDict<'_, '_> {
    fn check_first(&mut self) -> io::Result<()> {
        if self.first {
            if self.f.indent > 0 {
                writeln!(self.f.inner)?;
            }
            self.f.indent()?;
            writeln!(self.f.inner, "<<")?;
            self.first = false;
        }
        Ok(())
    }

    /// Write a field
    pub fn field(&mut self, name: &str, value: &dyn Serialize) -> io::Result<&mut Self> {
        self.check_first()?;
        self.f.indent += 2;
        self.f.indent()?;
        self.f.needs_space = write_name(name, &mut self.f.inner)?;
        value.write(self.f)?;
        writeln!(self.f.inner)?;
        self.f.indent -= 2;
        Ok(self)
    }

    /// Write flattened
    pub fn embed<X: ToDict + ?Sized>(&mut self, embed: &X) -> io::Result<&mut Self> {
        embed.write(self)?;
        Ok(self)
    }

    /// Write entries that were rendered ahead of time with [`Formatter::entries`]
    pub fn raw(&mut self, entries: &[u8]) -> io::Result<&mut Self> {
        self.check_first()?;
        self.f.inner.write_all(entries)?;
        Ok(self)
    }

    /// Write an optional field, if it is not `None`
    pub fn opt_field<X: Serialize>(
        &mut self,
        name: &str,
        field: &Option<X>,
    ) -> io::Result<&mut Self> {
        if let Some(value) = field {
            self.field(name, value)
        } else {
            Ok(self)
        }
    }

    /// Write a slice-valued field
    pub fn arr_field<X: Serialize>(&mut self, name: &str, array: &[X]) -> io::Result<&mut Self> {
        self.check_first()?;
        self.f.indent += 2;
        self.f.indent()?;
        write_name(name, &mut self.f.inner)?;

        self.f.pdf_arr().entries(array)?.finish()?;

        writeln!(self.f.inner)?;
        self.f.indent -= 2;
        Ok(self)
    }

    /// Write a slice-valued field, skip if empty
    pub fn opt_arr_field<X: Serialize>(
        &mut self,
        name: &str,
        array: &[X],
    ) -> io::Result<&mut Self> {
        if array.is_empty() {
            Ok(self)
        } else {
            self.arr_field(name, array)
        }
    }

    /// Close the dict
    pub fn finish(&mut self) -> io::Result<()> {
        if self.first {
            write!(self.f.inner, "<< >>")?;
        } else {
            self.f.indent()?;
            write!(self.f.inner, ">>")?;
        }
        self.f.needs_space = false;
        Ok(())
    }
}

/// API to serialize a type into a dict
pub trait ToDict {
    /// Add the keys to the dict
    fn write(&self, dict: &mut PdfDict<'_, '_>) -> io::Result<()>;
}

/// API to serialize an array
#[must_use]
pub struct PdfArr<'a, 'b> {
    first: bool,
    f: &'b mut Formatter<'a>,
}

impl PdfArr<'_, '_> {
    fn check_first(&mut self) -> io::Result<()> {
        if self.first {
            write!(self.f.inner, "[")?;
            self.first = false;
            self.f.needs_space = false;
        }
        Ok(())
    }

    /// Write the next entry
    pub fn entry(&mut self, value: &dyn Serialize) -> io::Result<&mut Self> {
        self.check_first()?;
        value.write(self.f)?;
        Ok(self)
    }

    /// Write entries from an iterator
    pub fn entries<X: Serialize>(
        &mut self,
        i: impl IntoIterator<Item = X>,
    ) -> io::Result<&mut Self> {
        for entry in i.into_iter() {
            self.entry(&entry)?;
        }
        Ok(self)
    }

    /// Close the array
    pub fn finish(&mut self) -> io::Result<()> {
        if self.first {
            write!(self.f.inner, "[]")?;
        } else {
            write!(self.f.inner, "]")?;
        }
        self.f.needs_space = false;
        Ok(())
    }
}

/// One line of the cross-reference table
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct XrefEntry {
    /// Byte offset of the `n g obj` line
    pub offset: usize,
    /// Generation number
    pub gen: u16,
    /// Whether the entry is part of the free list
    pub free: bool,
}

/// Formatter for a PDF document
pub struct Formatter<'a> {
    pub(crate) inner: ByteCounter<&'a mut dyn Write>,
    indent: usize,
    needs_space: bool,
    pub(crate) xref: Vec<Option<XrefEntry>>,
}

impl<'a> Formatter<'a> {
    /// Create a new formatter
    pub fn new(w: &'a mut dyn Write) -> Self {
        Self {
            inner: ByteCounter::new(w),
            indent: 0,
            needs_space: false,
            xref: vec![Some(XrefEntry {
                offset: 0,
                gen: 65535,
                free: true,
            })],
        }
    }

    /// Start writing a PDF dict
    pub fn pdf_dict(&mut self) -> PdfDict<'a, '_> {
        PdfDict {
            first: true,
            f: self,
        }
    }

    /// Write bare dict entries, without the surrounding `<<` and `>>`
    ///
    /// The output can later be spliced into a dict with [`PdfDict::raw`].
    pub fn entries(&mut self) -> PdfDict<'a, '_> {
        PdfDict {
            first: false,
            f: self,
        }
    }

    /// Start writing a PDF array
    pub fn pdf_arr(&mut self) -> PdfArr<'a, '_> {
        PdfArr {
            first: true,
            f: self,
        }
    }

    /// Write stream data, right after its dict
    pub fn pdf_stream(&mut self, data: &[u8]) -> io::Result<()> {
        writeln!(self.inner)?;
        writeln!(self.inner, "stream")?;
        self.inner.write_all(data)?;
        writeln!(self.inner)?;
        write!(self.inner, "endstream")?;
        Ok(())
    }

    /// Write bytes that already are valid PDF syntax
    pub fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.needs_space = false;
        Ok(())
    }

    /// The number of bytes written so far
    pub fn offset(&self) -> usize {
        self.inner.bytes_written()
    }

    /// Write an indirect object and record its offset for the xref table
    pub fn obj(&mut self, r#ref: ObjRef, obj: &dyn Serialize) -> io::Result<()> {
        let offset = self.inner.bytes_written();
        writeln!(self.inner, "{} {} obj", r#ref.id, r#ref.gen)?;
        self.needs_space = false;
        obj.write(self)?;
        writeln!(self.inner)?;
        writeln!(self.inner, "endobj")?;

        let index = r#ref.id as usize;
        while self.xref.len() <= index {
            self.xref.push(None);
        }
        self.xref[index] = Some(XrefEntry {
            offset,
            gen: r#ref.gen,
            free: false,
        });
        Ok(())
    }

    /// Write a classic xref section, returning its offset
    pub fn xref(&mut self) -> io::Result<usize> {
        let offset = self.inner.bytes_written();
        writeln!(self.inner, "xref")?;

        let mut rest = &self.xref[..];
        let mut index = 0;
        while let Some(pos) = rest.iter().position(Option::is_some) {
            rest = &rest[pos..];
            index += pos;
            let mid = rest.iter().position(Option::is_none).unwrap_or(rest.len());
            let (a, b) = rest.split_at(mid);

            writeln!(self.inner, "{} {}", index, mid)?;
            for entry in a.iter().flatten() {
                let mark = if entry.free { 'f' } else { 'n' };
                // NOTE: every line is exactly 20 bytes, so the eol has to be two bytes (SP LF)
                writeln!(self.inner, "{:010} {:05} {} ", entry.offset, entry.gen, mark)?;
            }

            rest = b;
            index += mid;
        }

        Ok(offset)
    }

    /// The number of entries in the xref table, including the free head
    pub fn xref_len(&self) -> usize {
        self.xref.len()
    }

    fn indent(&mut self) -> io::Result<()> {
        write!(self.inner, "{:indent$}", "", indent = self.indent)?;
        Ok(())
    }
}

/// Render a value into a standalone buffer
pub fn to_bytes(value: &dyn Serialize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut f = Formatter::new(&mut buf);
        value.write(&mut f)?;
    }
    Ok(buf)
}

/// Render the keys of `value` as bare dict entries, see [`Formatter::entries`]
pub fn entries_to_bytes(value: &dyn ToDict) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut f = Formatter::new(&mut buf);
        value.write(&mut f.entries())?;
    }
    Ok(buf)
}

/// Trait to serialize some PDF object
pub trait Serialize {
    /// Write the object to a stream
    fn write(&self, f: &mut Formatter) -> io::Result<()>;
}

impl<X: Serialize + ?Sized> Serialize for &'_ X {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        (*self).write(f)
    }
}

impl<X: Serialize + ?Sized> Serialize for Box<X> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        self.as_ref().write(f)
    }
}

impl Serialize for PdfString {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.needs_space = write_string(self.as_bytes(), &mut f.inner)?;
        Ok(())
    }
}

impl Serialize for md5::Digest {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.needs_space = false;
        write!(f.inner, "<{:x}>", self)
    }
}

macro_rules! serialize_display_impl {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn write(&self, f: &mut Formatter) -> io::Result<()> {
                if f.needs_space {
                    write!(f.inner, " ")?;
                }
                write!(f.inner, "{}", self)?;
                f.needs_space = true;
                Ok(())
            }
        }
    };
}

serialize_display_impl!(u8);
serialize_display_impl!(u16);
serialize_display_impl!(u32);
serialize_display_impl!(u64);
serialize_display_impl!(usize);
serialize_display_impl!(i32);
serialize_display_impl!(i64);
serialize_display_impl!(bool);

impl Serialize for f32 {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        if f.needs_space {
            write!(f.inner, " ")?;
        }
        // PDF has no exponent syntax and no NaN
        let value = if self.is_finite() { *self } else { 0.0 };
        write!(f.inner, "{}", value)?;
        f.needs_space = true;
        Ok(())
    }
}

impl<X: Serialize> Serialize for Vec<X> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        self.as_slice().write(f)
    }
}

impl<X: Serialize> Serialize for [X] {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_arr().entries(self)?.finish()
    }
}

impl<X: Serialize, const N: usize> Serialize for [X; N] {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        self.as_slice().write(f)
    }
}

impl<A: Serialize, B: Serialize> Serialize for (A, B) {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.pdf_arr().entry(&self.0)?.entry(&self.1)?.finish()
    }
}

impl Serialize for ObjRef {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        if f.needs_space {
            write!(f.inner, " ")?;
        }
        f.needs_space = write_ref(*self, &mut f.inner)?;
        Ok(())
    }
}

/// The PDF `null` object
#[derive(Debug, Copy, Clone)]
pub struct Null;

impl Serialize for Null {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        if f.needs_space {
            write!(f.inner, " ")?;
        }
        write!(f.inner, "null")?;
        f.needs_space = true;
        Ok(())
    }
}

/// A borrowed PDF name (e.g. `/Info`)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PdfName<'a>(pub &'a str);

impl Serialize for PdfName<'_> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        f.needs_space = write_name(self.0, &mut f.inner)?;
        Ok(())
    }
}

/// An owned PDF name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfNameBuf(pub String);

impl PdfNameBuf {
    /// Borrow as a [`PdfName`]
    pub fn as_name(&self) -> PdfName<'_> {
        PdfName(&self.0)
    }
}

impl Serialize for PdfNameBuf {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        self.as_name().write(f)
    }
}

impl Serialize for DateTime<FixedOffset> {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let off_sec = self.offset().local_minus_utc();
        let (off_sec, mark) = if off_sec < 0 {
            (-off_sec, '-')
        } else {
            (off_sec, '+')
        };
        let off_min = off_sec / 60;
        let (off_min, off_hor) = (off_min % 60, off_min / 60);
        let date_time = format!(
            "D:{}{}{:02}'{:02}",
            self.format("%Y%m%d%H%M%S"),
            mark,
            off_hor,
            off_min
        );
        f.needs_space = write_string(date_time.as_bytes(), &mut f.inner)?;
        Ok(())
    }
}

/// Writes a complete literal string to a writer
pub fn write_string<W: Write>(bytes: &[u8], w: &mut W) -> io::Result<bool> {
    write!(w, "(")?;
    for byte in bytes.iter().copied() {
        match byte {
            b'\\' => write!(w, "\\\\")?,
            b'(' => write!(w, "\\(")?,
            b')' => write!(w, "\\)")?,
            0..=31 | 127..=255 => write!(w, "\\{:03o}", byte)?,
            _ => w.write_all(&[byte])?,
        }
    }
    write!(w, ")")?;
    Ok(false)
}

/// Write a borrowed string as a PDF name, escaping delimiters with `#xx`
pub fn write_name<W: Write>(name: &str, w: &mut W) -> io::Result<bool> {
    write!(w, "/")?;
    for byte in name.bytes() {
        match byte {
            b'#' | b'/' | b'%' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' => {
                write!(w, "#{:02X}", byte)?
            }
            0x21..=0x7E => w.write_all(&[byte])?,
            _ => write!(w, "#{:02X}", byte)?,
        }
    }
    Ok(true)
}

/// Write a plain reference
pub fn write_ref<W: Write>(plain_ref: ObjRef, w: &mut W) -> io::Result<bool> {
    write!(w, "{} {} R", plain_ref.id, plain_ref.gen)?;
    Ok(true)
}
