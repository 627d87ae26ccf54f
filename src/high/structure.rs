use serde::Deserialize;

/// Standard structure types (PDF 1.7, 14.8.4)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[allow(missing_docs, clippy::upper_case_acronyms)]
pub enum StructureType {
    Document,
    Part,
    Art,
    Sect,
    Div,
    BlockQuote,
    Caption,
    TOC,
    TOCI,
    Index,
    NonStruct,
    Private,
    P,
    H,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    L,
    LI,
    Lbl,
    LBody,
    Table,
    TR,
    TH,
    TD,
    THead,
    TBody,
    TFoot,
    Span,
    Quote,
    Note,
    Reference,
    BibEntry,
    Code,
    Link,
    Annot,
    Ruby,
    Warichu,
    Figure,
    Formula,
    Form,
    /// A type outside the standard set
    Custom(String),
}

const STANDARD_NAMES: [&str; 44] = [
    "Document",
    "Part",
    "Art",
    "Sect",
    "Div",
    "BlockQuote",
    "Caption",
    "TOC",
    "TOCI",
    "Index",
    "NonStruct",
    "Private",
    "P",
    "H",
    "H1",
    "H2",
    "H3",
    "H4",
    "H5",
    "H6",
    "L",
    "LI",
    "Lbl",
    "LBody",
    "Table",
    "TR",
    "TH",
    "TD",
    "THead",
    "TBody",
    "TFoot",
    "Span",
    "Quote",
    "Note",
    "Reference",
    "BibEntry",
    "Code",
    "Link",
    "Annot",
    "Ruby",
    "Warichu",
    "Figure",
    "Formula",
    "Form",
];

impl StructureType {
    /// The value of `/S`
    pub fn name(&self) -> &str {
        use StructureType::*;
        let index = match self {
            Custom(name) => return name,
            Document => 0,
            Part => 1,
            Art => 2,
            Sect => 3,
            Div => 4,
            BlockQuote => 5,
            Caption => 6,
            TOC => 7,
            TOCI => 8,
            Index => 9,
            NonStruct => 10,
            Private => 11,
            P => 12,
            H => 13,
            H1 => 14,
            H2 => 15,
            H3 => 16,
            H4 => 17,
            H5 => 18,
            H6 => 19,
            L => 20,
            LI => 21,
            Lbl => 22,
            LBody => 23,
            Table => 24,
            TR => 25,
            TH => 26,
            TD => 27,
            THead => 28,
            TBody => 29,
            TFoot => 30,
            Span => 31,
            Quote => 32,
            Note => 33,
            Reference => 34,
            BibEntry => 35,
            Code => 36,
            Link => 37,
            Annot => 38,
            Ruby => 39,
            Warichu => 40,
            Figure => 41,
            Formula => 42,
            Form => 43,
        };
        STANDARD_NAMES[index]
    }

    /// Parse a structure type name, unknown names become [`StructureType::Custom`]
    pub fn from_name(name: &str) -> Self {
        use StructureType::*;
        match STANDARD_NAMES.iter().position(|n| *n == name) {
            Some(0) => Document,
            Some(1) => Part,
            Some(2) => Art,
            Some(3) => Sect,
            Some(4) => Div,
            Some(5) => BlockQuote,
            Some(6) => Caption,
            Some(7) => TOC,
            Some(8) => TOCI,
            Some(9) => Index,
            Some(10) => NonStruct,
            Some(11) => Private,
            Some(12) => P,
            Some(13) => H,
            Some(14) => H1,
            Some(15) => H2,
            Some(16) => H3,
            Some(17) => H4,
            Some(18) => H5,
            Some(19) => H6,
            Some(20) => L,
            Some(21) => LI,
            Some(22) => Lbl,
            Some(23) => LBody,
            Some(24) => Table,
            Some(25) => TR,
            Some(26) => TH,
            Some(27) => TD,
            Some(28) => THead,
            Some(29) => TBody,
            Some(30) => TFoot,
            Some(31) => Span,
            Some(32) => Quote,
            Some(33) => Note,
            Some(34) => Reference,
            Some(35) => BibEntry,
            Some(36) => Code,
            Some(37) => Link,
            Some(38) => Annot,
            Some(39) => Ruby,
            Some(40) => Warichu,
            Some(41) => Figure,
            Some(42) => Formula,
            Some(43) => Form,
            _ => Custom(name.to_owned()),
        }
    }
}

/// Optional entries of a structure element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureAttributes {
    /// `/T`
    pub title: Option<String>,
    /// `/Alt`, e.g. for figures
    pub alt: Option<String>,
    /// `/ActualText`
    pub actual_text: Option<String>,
    /// `/Lang`
    pub lang: Option<String>,
}
