/// Bulk imports from spreadsheet files
///
/// Two sheet layouts are accepted. Field teams deliver voter rosters as
/// Excel sheets, one voter per row:
///
/// | col | field        | required                          |
/// |-----|--------------|-----------------------------------|
/// | 0   | voter_number | yes                               |
/// | 1   | name         | yes                               |
/// | 2   | governorate  | yes                               |
/// | 3   | district     | yes                               |
/// | 4   | sub_district | no (defaults to empty)            |
/// | 5   | card_status  | no (defaults to not updated)      |
/// | 6   | center_name  | yes                               |
/// | 7   | center_number| yes                               |
/// | 8   | station      | yes                               |
/// | 9   | phone        | no                                |
///
/// Entities onboard their candidates the same way, one account per row:
///
/// | col | field             | required |
/// |-----|-------------------|----------|
/// | 0   | username          | yes      |
/// | 1   | full_name         | yes      |
/// | 2   | phone             | no       |
/// | 3   | profile_image_url | no       |
///
/// In either layout the first row is treated as a header and skipped. Rows
/// are processed sequentially and each good row commits independently: a bad
/// row is reported with its spreadsheet row number and does not roll back the
/// rows before it, so a 10,000-row file with one typo still loads 9,999
/// records.

use std::io::Cursor;

use calamine::{DataType, Range, Reader, Xls, Xlsx};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::candidate::{Candidate, CreateCandidate};
use crate::models::voter::{CardStatus, CreateVoter, Voter};

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// File extension is not an accepted spreadsheet type
    #[error("Unsupported file type: {0} (expected .xlsx or .xls)")]
    UnsupportedFileType(String),

    /// Workbook contains no sheets
    #[error("Workbook contains no sheets")]
    EmptyWorkbook,

    /// Workbook could not be parsed
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),
}

/// One rejected row, reported back to the uploader
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowError {
    /// 1-based spreadsheet row number, as the uploader sees it in Excel
    pub row: usize,

    /// What was wrong with the row
    pub message: String,
}

/// Outcome of an import run
#[derive(Debug, Clone, Serialize, Default)]
pub struct ImportReport {
    /// Rows turned into records
    pub created: usize,

    /// Rows rejected, with reasons
    pub errors: Vec<RowError>,
}

/// A parsed voter row, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterRow {
    pub voter_number: String,
    pub name: String,
    pub governorate: String,
    pub district: String,
    pub sub_district: String,
    pub card_status: CardStatus,
    pub center_name: String,
    pub center_number: String,
    pub station: String,
    pub phone: Option<String>,
}

impl VoterRow {
    /// Parses one spreadsheet row into a voter
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when a required field is empty or
    /// the card status token is unknown.
    pub fn parse(cells: &[DataType]) -> Result<Self, String> {
        let field = |idx: usize| cell_text(cells.get(idx).unwrap_or(&DataType::Empty));

        let required = |idx: usize, label: &str| {
            let value = field(idx);
            if value.is_empty() {
                Err(format!("Missing required field: {}", label))
            } else {
                Ok(value)
            }
        };

        let card_status = {
            let token = field(5);
            if token.is_empty() {
                CardStatus::NotUpdated
            } else {
                CardStatus::from_token(&token)
                    .ok_or_else(|| format!("Unknown card status: {}", token))?
            }
        };

        let phone = {
            let value = field(9);
            if value.is_empty() {
                None
            } else {
                Some(value)
            }
        };

        Ok(Self {
            voter_number: required(0, "voter_number")?,
            name: required(1, "name")?,
            governorate: required(2, "governorate")?,
            district: required(3, "district")?,
            sub_district: field(4),
            card_status,
            center_name: required(6, "center_name")?,
            center_number: required(7, "center_number")?,
            station: required(8, "station")?,
            phone,
        })
    }

    fn into_create(self, pillar_id: Uuid) -> CreateVoter {
        CreateVoter {
            voter_number: self.voter_number,
            name: self.name,
            governorate: self.governorate,
            district: self.district,
            sub_district: self.sub_district,
            card_status: self.card_status,
            center_name: self.center_name,
            center_number: self.center_number,
            station: self.station,
            phone: self.phone,
            pillar_id,
        }
    }
}

/// A parsed candidate account row, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub username: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
}

impl CandidateRow {
    /// Parses one spreadsheet row into a candidate account
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the username or full name cell
    /// is empty.
    pub fn parse(cells: &[DataType]) -> Result<Self, String> {
        let field = |idx: usize| cell_text(cells.get(idx).unwrap_or(&DataType::Empty));

        let required = |idx: usize, label: &str| {
            let value = field(idx);
            if value.is_empty() {
                Err(format!("Missing required field: {}", label))
            } else {
                Ok(value)
            }
        };

        let optional = |idx: usize| {
            let value = field(idx);
            if value.is_empty() {
                None
            } else {
                Some(value)
            }
        };

        Ok(Self {
            username: required(0, "username")?,
            full_name: required(1, "full_name")?,
            phone: optional(2),
            profile_image_url: optional(3),
        })
    }

    fn into_create(self, entity_id: Uuid, password_hash: String) -> CreateCandidate {
        CreateCandidate {
            username: self.username,
            password_hash,
            full_name: self.full_name,
            phone: self.phone,
            entity_id,
            profile_image_url: self.profile_image_url,
        }
    }
}

/// Renders one cell as trimmed text
///
/// Numbers are common in voter-number and center-number columns when the
/// sheet was typed by hand; whole floats lose their `.0`.
pub fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Opens the first worksheet of an uploaded spreadsheet
///
/// The extension is checked before any parsing so an unexpected upload is
/// refused with a clear message instead of a parser error.
pub fn sheet_from_bytes(file_name: &str, data: Vec<u8>) -> Result<Range<DataType>, ImportError> {
    let lower = file_name.to_lowercase();

    if lower.ends_with(".xlsx") {
        let mut workbook = Xlsx::new(Cursor::new(data))
            .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;
        workbook
            .worksheet_range_at(0)
            .ok_or(ImportError::EmptyWorkbook)?
            .map_err(|e| ImportError::Spreadsheet(e.to_string()))
    } else if lower.ends_with(".xls") {
        let mut workbook =
            Xls::new(Cursor::new(data)).map_err(|e| ImportError::Spreadsheet(e.to_string()))?;
        workbook
            .worksheet_range_at(0)
            .ok_or(ImportError::EmptyWorkbook)?
            .map_err(|e| ImportError::Spreadsheet(e.to_string()))
    } else {
        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or("(none)")
            .to_string();
        Err(ImportError::UnsupportedFileType(extension))
    }
}

/// Imports every data row of a sheet as voters of one pillar
///
/// Row 1 is the header. Each row is parsed and inserted on its own, so
/// earlier successes stay committed when a later row fails. Database
/// rejections (duplicate voter numbers included) are reported per row the
/// same way as parse failures.
pub async fn import_voters(
    pool: &PgPool,
    pillar_id: Uuid,
    sheet: &Range<DataType>,
) -> Result<ImportReport, sqlx::Error> {
    let mut report = ImportReport::default();

    for (idx, cells) in sheet.rows().enumerate().skip(1) {
        // Spreadsheet rows are 1-based and row 1 is the header
        let row_number = idx + 1;

        if cells.iter().all(|c| matches!(c, DataType::Empty)) {
            continue;
        }

        let row = match VoterRow::parse(cells) {
            Ok(row) => row,
            Err(message) => {
                report.errors.push(RowError {
                    row: row_number,
                    message,
                });
                continue;
            }
        };

        match Voter::create(pool, row.into_create(pillar_id)).await {
            Ok(_) => report.created += 1,
            Err(sqlx::Error::Database(db_err)) => {
                let message = if db_err.constraint().is_some_and(|c| c.contains("voter_number")) {
                    "Duplicate voter number".to_string()
                } else {
                    format!("Database rejected row: {}", db_err)
                };
                report.errors.push(RowError {
                    row: row_number,
                    message,
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        pillar_id = %pillar_id,
        created = report.created,
        rejected = report.errors.len(),
        "voter import finished"
    );

    Ok(report)
}

/// Imports every data row of a sheet as candidate accounts of one entity
///
/// Each row creates the backing user and the candidate profile in its own
/// transaction, so earlier successes stay committed when a later row fails.
/// All created accounts share the given password hash; the credentials are
/// handed to the entity out of band.
pub async fn import_candidates(
    pool: &PgPool,
    entity_id: Uuid,
    password_hash: &str,
    sheet: &Range<DataType>,
) -> Result<ImportReport, sqlx::Error> {
    let mut report = ImportReport::default();

    for (idx, cells) in sheet.rows().enumerate().skip(1) {
        // Spreadsheet rows are 1-based and row 1 is the header
        let row_number = idx + 1;

        if cells.iter().all(|c| matches!(c, DataType::Empty)) {
            continue;
        }

        let row = match CandidateRow::parse(cells) {
            Ok(row) => row,
            Err(message) => {
                report.errors.push(RowError {
                    row: row_number,
                    message,
                });
                continue;
            }
        };

        let create = row.into_create(entity_id, password_hash.to_string());
        match Candidate::create_with_user(pool, create).await {
            Ok(_) => report.created += 1,
            Err(sqlx::Error::Database(db_err)) => {
                let message = if db_err.constraint().is_some_and(|c| c.contains("username")) {
                    "Duplicate username".to_string()
                } else {
                    format!("Database rejected row: {}", db_err)
                };
                report.errors.push(RowError {
                    row: row_number,
                    message,
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        entity_id = %entity_id,
        created = report.created,
        rejected = report.errors.len(),
        "candidate import finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<DataType> {
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    DataType::Empty
                } else {
                    DataType::String(v.to_string())
                }
            })
            .collect()
    }

    #[test]
    fn test_parse_full_row() {
        let row = VoterRow::parse(&cells(&[
            "1002003",
            "Layla Hasan",
            "Baghdad",
            "Karkh",
            "Mansour",
            "محدث",
            "Al-Amal School",
            "44",
            "3",
            "07701234567",
        ]))
        .unwrap();

        assert_eq!(row.voter_number, "1002003");
        assert_eq!(row.name, "Layla Hasan");
        assert_eq!(row.sub_district, "Mansour");
        assert_eq!(row.card_status, CardStatus::Updated);
        assert_eq!(row.phone.as_deref(), Some("07701234567"));
    }

    #[test]
    fn test_parse_defaults() {
        // sub_district, card_status and phone are optional
        let row = VoterRow::parse(&cells(&[
            "1002003",
            "Layla Hasan",
            "Baghdad",
            "Karkh",
            "",
            "",
            "Al-Amal School",
            "44",
            "3",
            "",
        ]))
        .unwrap();

        assert_eq!(row.sub_district, "");
        assert_eq!(row.card_status, CardStatus::NotUpdated);
        assert!(row.phone.is_none());
    }

    #[test]
    fn test_parse_short_row() {
        // Trailing optional columns may be missing entirely
        let row = VoterRow::parse(&cells(&[
            "1002003",
            "Layla Hasan",
            "Baghdad",
            "Karkh",
            "",
            "",
            "Al-Amal School",
            "44",
            "3",
        ]))
        .unwrap();

        assert!(row.phone.is_none());
    }

    #[test]
    fn test_parse_missing_required_field() {
        let err = VoterRow::parse(&cells(&[
            "",
            "Layla Hasan",
            "Baghdad",
            "Karkh",
            "",
            "",
            "Al-Amal School",
            "44",
            "3",
        ]))
        .unwrap_err();
        assert!(err.contains("voter_number"));

        let err = VoterRow::parse(&cells(&["1002003", "", "Baghdad", "Karkh"])).unwrap_err();
        assert!(err.contains("name"));
    }

    #[test]
    fn test_parse_unknown_card_status() {
        let err = VoterRow::parse(&cells(&[
            "1002003",
            "Layla Hasan",
            "Baghdad",
            "Karkh",
            "",
            "perhaps",
            "Al-Amal School",
            "44",
            "3",
        ]))
        .unwrap_err();
        assert!(err.contains("Unknown card status"));
    }

    #[test]
    fn test_parse_candidate_row() {
        let row = CandidateRow::parse(&cells(&[
            "ahmed.salim",
            "Ahmed Salim",
            "07709876543",
            "https://cdn.example.com/ahmed.jpg",
        ]))
        .unwrap();

        assert_eq!(row.username, "ahmed.salim");
        assert_eq!(row.full_name, "Ahmed Salim");
        assert_eq!(row.phone.as_deref(), Some("07709876543"));
        assert_eq!(
            row.profile_image_url.as_deref(),
            Some("https://cdn.example.com/ahmed.jpg")
        );
    }

    #[test]
    fn test_parse_candidate_row_defaults() {
        // Only username and full name are required
        let row = CandidateRow::parse(&cells(&["ahmed.salim", "Ahmed Salim"])).unwrap();

        assert!(row.phone.is_none());
        assert!(row.profile_image_url.is_none());
    }

    #[test]
    fn test_parse_candidate_row_missing_required_field() {
        let err = CandidateRow::parse(&cells(&["", "Ahmed Salim"])).unwrap_err();
        assert!(err.contains("username"));

        let err = CandidateRow::parse(&cells(&["ahmed.salim", ""])).unwrap_err();
        assert!(err.contains("full_name"));
    }

    #[test]
    fn test_cell_text_numeric_cells() {
        // Excel turns typed numbers into floats
        assert_eq!(cell_text(&DataType::Float(1002003.0)), "1002003");
        assert_eq!(cell_text(&DataType::Float(1.5)), "1.5");
        assert_eq!(cell_text(&DataType::Int(44)), "44");
        assert_eq!(cell_text(&DataType::String("  padded  ".to_string())), "padded");
        assert_eq!(cell_text(&DataType::Empty), "");
    }

    #[test]
    fn test_parse_numeric_voter_number() {
        let mut row_cells = cells(&[
            "",
            "Layla Hasan",
            "Baghdad",
            "Karkh",
            "",
            "",
            "Al-Amal School",
            "",
            "3",
        ]);
        row_cells[0] = DataType::Float(1002003.0);
        row_cells[7] = DataType::Int(44);

        let row = VoterRow::parse(&row_cells).unwrap();
        assert_eq!(row.voter_number, "1002003");
        assert_eq!(row.center_number, "44");
    }

    #[test]
    fn test_sheet_from_bytes_rejects_extension() {
        let err = sheet_from_bytes("voters.csv", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFileType(ext) if ext == "csv"));

        let err = sheet_from_bytes("voters", vec![]).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_sheet_from_bytes_rejects_garbage_xlsx() {
        let err = sheet_from_bytes("voters.xlsx", b"not a zip archive".to_vec()).unwrap_err();
        assert!(matches!(err, ImportError::Spreadsheet(_)));
    }
}
