use std::fmt;
use std::fs::File;
use std::path::Path;
use log::info;
use tabled::builder::Builder;
use tabled::settings::{object::Rows, Alignment, Modify, Style};
use crate::error::ReportError;
use crate::scraper::ProspectRecord;

/// Joins multi-valued fields in both the table and the export.
pub const FIELD_SEPARATOR: &str = ";";
pub const EXPORT_HEADERS: [&str; 6] = ["domain", "url", "title", "snippet", "emails", "contactLinks"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Domain,
    Url,
    Title,
    Snippet,
    Emails,
    ContactLinks,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::Domain => "domain",
            Column::Url => "url",
            Column::Title => "title",
            Column::Snippet => "snippet",
            Column::Emails => "emails",
            Column::ContactLinks => "contactLinks",
        }
    }

    fn value(&self, record: &ProspectRecord) -> String {
        match self {
            Column::Domain => record.domain.clone(),
            Column::Url => record.url.clone(),
            Column::Title => record.title.clone(),
            Column::Snippet => record.snippet.clone(),
            Column::Emails => record.emails.join(FIELD_SEPARATOR),
            Column::ContactLinks => record.contact_links.join(FIELD_SEPARATOR),
        }
    }
}

/// Which optional columns the table view shows. Domain, url, emails and
/// contact links are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    pub title_and_snippet: bool,
}

impl ColumnSelection {
    pub fn with_title_snippet() -> Self {
        ColumnSelection { title_and_snippet: true }
    }

    pub fn columns(&self) -> Vec<Column> {
        let mut cols = vec![Column::Domain, Column::Url, Column::Emails, Column::ContactLinks];
        if self.title_and_snippet {
            cols.extend([Column::Title, Column::Snippet]);
        }
        cols
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(String::as_str));
        for row in &self.rows {
            builder.push_record(row.iter().map(String::as_str));
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        write!(f, "{}", table)
    }
}

pub struct Report;

impl Report {
    pub fn table(records: &[ProspectRecord], selection: ColumnSelection) -> Table {
        let columns = selection.columns();
        Table {
            headers: columns.iter().map(|c| c.header().to_string()).collect(),
            rows: records
                .iter()
                .map(|r| columns.iter().map(|c| c.value(r)).collect())
                .collect(),
        }
    }

    /// Full fixed-column export with a header row.
    pub fn to_csv(records: &[ProspectRecord]) -> Result<String, ReportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        Self::write_records(&mut writer, records)?;
        let bytes = writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))?;
        Ok(String::from_utf8(bytes)?)
    }

    pub fn write_csv<P: AsRef<Path>>(records: &[ProspectRecord], path: P) -> Result<(), ReportError> {
        let file = File::create(path.as_ref())?;
        let mut writer = csv::Writer::from_writer(file);
        Self::write_records(&mut writer, records)?;
        writer.flush()?;
        info!("Wrote {} prospects to {}", records.len(), path.as_ref().display());
        Ok(())
    }

    fn write_records<W: std::io::Write>(writer: &mut csv::Writer<W>, records: &[ProspectRecord]) -> Result<(), ReportError> {
        writer.write_record(EXPORT_HEADERS)?;
        let columns = [
            Column::Domain,
            Column::Url,
            Column::Title,
            Column::Snippet,
            Column::Emails,
            Column::ContactLinks,
        ];
        for record in records {
            writer.write_record(columns.iter().map(|c| c.value(record)))?;
        }
        Ok(())
    }
}
