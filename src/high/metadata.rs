use std::io;

use chrono::{DateTime, FixedOffset, Local};

use crate::{
    common::PdfString,
    write::{Formatter, Serialize},
};

/// The Metadata/Info
#[derive(Debug, Default, Clone)]
pub struct Info {
    /// The title
    pub title: Option<PdfString>,
    /// The author
    pub author: Option<PdfString>,
    /// The subject
    pub subject: Option<PdfString>,
    /// A list of keywords
    pub keywords: Option<PdfString>,
    /// The program used to create the source
    pub creator: Option<PdfString>,
    /// The program that produced the file
    pub producer: Option<PdfString>,

    /// The date of creation
    pub creation_date: Option<DateTime<FixedOffset>>,
    /// The date of the last modification
    pub mod_date: Option<DateTime<FixedOffset>>,
}

impl Info {
    /// Text fields from plain strings, both dates set to now
    pub fn new(
        title: Option<&str>,
        author: Option<&str>,
        subject: Option<&str>,
        keywords: Option<&str>,
        creator: Option<&str>,
        producer: Option<&str>,
    ) -> Self {
        let now = Local::now().fixed_offset();
        Self {
            title: title.map(PdfString::text),
            author: author.map(PdfString::text),
            subject: subject.map(PdfString::text),
            keywords: keywords.map(PdfString::text),
            creator: creator.map(PdfString::text),
            producer: producer.map(PdfString::text),
            creation_date: Some(now),
            mod_date: Some(now),
        }
    }

    /// Feed the values into the document ID
    pub(crate) fn digest_into(&self, ctx: &mut md5::Context) {
        let fields = [
            &self.title,
            &self.author,
            &self.subject,
            &self.keywords,
            &self.creator,
            &self.producer,
        ];
        for value in fields.into_iter().flatten() {
            ctx.consume(value.as_bytes());
        }
        if let Some(date) = &self.creation_date {
            ctx.consume(date.to_rfc3339());
        }
    }
}

impl Serialize for Info {
    fn write(&self, f: &mut Formatter) -> io::Result<()> {
        let mut dict = f.pdf_dict();
        if let Some(title) = &self.title {
            dict.field("Title", title)?;
        }
        if let Some(author) = &self.author {
            dict.field("Author", author)?;
        }
        if let Some(subject) = &self.subject {
            dict.field("Subject", subject)?;
        }
        if let Some(keywords) = &self.keywords {
            dict.field("Keywords", keywords)?;
        }
        if let Some(creator) = &self.creator {
            dict.field("Creator", creator)?;
        }
        if let Some(producer) = &self.producer {
            dict.field("Producer", producer)?;
        }

        if let Some(creation_date) = &self.creation_date {
            dict.field("CreationDate", creation_date)?;
        }
        if let Some(mod_date) = &self.mod_date {
            dict.field("ModDate", mod_date)?;
        }
        dict.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::Info;
    use crate::{common::PdfString, write::to_bytes};

    #[test]
    fn test_info() {
        let date = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .unwrap();
        let info = Info {
            title: Some(PdfString::text("Report")),
            author: Some(PdfString::text("\u{3042}")),
            creation_date: Some(date),
            ..Default::default()
        };
        let text = to_bytes(&info).unwrap();
        let text = String::from_utf8_lossy(&text);
        assert!(text.contains("/Title(Report)"));
        assert!(text.contains("/Author(\\376\\3770B)"));
        assert!(text.contains("/CreationDate(D:20240501123000+01'00)"));
        assert!(!text.contains("ModDate"));
    }
}
