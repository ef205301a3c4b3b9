//! CSV vertex table format
//!
//! The extractor writes one row per retained (face, loop) pair, either as
//! position-only rows (`face_index,vert_index,x,y,z`) or coloured rows
//! (`object_name,face_index,vert_index,x,y,z,r,g,b`). The reader maps columns
//! by header name, so column order is not significant when loading.

use crate::error::IoError;
use meshcloud_core::{PointSet, Point3f, Result, VertexRecord, VertexTable};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

const DELIMITER: char = ',';

/// Column types that can appear in a vertex table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    ObjectName,
    FaceIndex,
    VertexIndex,
    X,
    Y,
    Z,
    Red,
    Green,
    Blue,
    Unknown,
}

impl ColumnType {
    /// Parse column type from header name
    pub fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "object_name" | "object" | "name" => ColumnType::ObjectName,
            "face_index" | "face" => ColumnType::FaceIndex,
            "vert_index" | "vertex_index" | "vertex" => ColumnType::VertexIndex,
            "x" => ColumnType::X,
            "y" => ColumnType::Y,
            "z" => ColumnType::Z,
            "r" | "red" => ColumnType::Red,
            "g" | "green" => ColumnType::Green,
            "b" | "blue" => ColumnType::Blue,
            _ => ColumnType::Unknown,
        }
    }

    /// Header name written for this column
    pub fn header_name(&self) -> &'static str {
        match self {
            ColumnType::ObjectName => "object_name",
            ColumnType::FaceIndex => "face_index",
            ColumnType::VertexIndex => "vert_index",
            ColumnType::X => "x",
            ColumnType::Y => "y",
            ColumnType::Z => "z",
            ColumnType::Red => "r",
            ColumnType::Green => "g",
            ColumnType::Blue => "b",
            ColumnType::Unknown => "unknown",
        }
    }
}

/// Ordered column layout of a vertex table file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSchema {
    pub columns: Vec<ColumnType>,
}

impl CsvSchema {
    /// `face_index,vert_index,x,y,z`
    pub fn position_only() -> Self {
        Self {
            columns: vec![
                ColumnType::FaceIndex,
                ColumnType::VertexIndex,
                ColumnType::X,
                ColumnType::Y,
                ColumnType::Z,
            ],
        }
    }

    /// `object_name,face_index,vert_index,x,y,z,r,g,b`
    pub fn colored() -> Self {
        Self {
            columns: vec![
                ColumnType::ObjectName,
                ColumnType::FaceIndex,
                ColumnType::VertexIndex,
                ColumnType::X,
                ColumnType::Y,
                ColumnType::Z,
                ColumnType::Red,
                ColumnType::Green,
                ColumnType::Blue,
            ],
        }
    }

    /// Parse a header line; x, y and z are mandatory
    pub fn from_header_line(line: &str) -> std::result::Result<Self, IoError> {
        let columns: Vec<ColumnType> = split_fields(line)
            .iter()
            .map(|h| ColumnType::from_header(h))
            .collect();

        for required in [ColumnType::X, ColumnType::Y, ColumnType::Z] {
            if !columns.contains(&required) {
                return Err(IoError::ParseError {
                    line: 1,
                    message: format!("header is missing the '{}' column", required.header_name()),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Whether the schema carries all three colour channels
    pub fn has_colors(&self) -> bool {
        [ColumnType::Red, ColumnType::Green, ColumnType::Blue]
            .iter()
            .all(|c| self.columns.contains(c))
    }

    fn index_of(&self, column: ColumnType) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// Header line for this schema
    pub fn header_line(&self) -> String {
        self.columns
            .iter()
            .map(ColumnType::header_name)
            .collect::<Vec<_>>()
            .join(&DELIMITER.to_string())
    }
}

/// Split a CSV line on commas, honouring double-quoted fields
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == DELIMITER && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Quote a field if it contains the delimiter, quotes or line breaks
fn format_field(value: &str) -> String {
    if value.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Vertex table writer
pub struct VertexCsvWriter;

impl VertexCsvWriter {
    /// Write a table with the schema that fits it: coloured when every row has
    /// a colour, position-only otherwise
    pub fn write<P: AsRef<Path>>(table: &VertexTable, path: P) -> Result<()> {
        let schema = if table.is_colored() {
            CsvSchema::colored()
        } else {
            CsvSchema::position_only()
        };
        Self::write_with_schema(table, path, &schema)
    }

    /// Write a table with an explicit schema, creating the parent directory
    /// if it does not exist.
    ///
    /// A colour schema requires every row to carry a colour so the column
    /// count of every row matches the header.
    pub fn write_with_schema<P: AsRef<Path>>(
        table: &VertexTable,
        path: P,
        schema: &CsvSchema,
    ) -> Result<()> {
        let path = path.as_ref();

        if schema.has_colors() {
            if let Some(pos) = table.iter().position(|r| r.color.is_none()) {
                return Err(IoError::WriteError {
                    message: format!("row {pos} has no colour but the schema requires r,g,b"),
                }
                .into());
            }
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}", schema.header_line())?;
        for record in table {
            writeln!(writer, "{}", Self::format_record(record, schema))?;
        }

        writer.flush()?;
        info!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    fn format_record(record: &VertexRecord, schema: &CsvSchema) -> String {
        let color = record.color.unwrap_or([0.0; 3]);
        schema
            .columns
            .iter()
            .map(|col| match col {
                ColumnType::ObjectName => format_field(&record.object_name),
                ColumnType::FaceIndex => record.face_index.to_string(),
                ColumnType::VertexIndex => record.vertex_index.to_string(),
                ColumnType::X => record.position.x.to_string(),
                ColumnType::Y => record.position.y.to_string(),
                ColumnType::Z => record.position.z.to_string(),
                ColumnType::Red => color[0].to_string(),
                ColumnType::Green => color[1].to_string(),
                ColumnType::Blue => color[2].to_string(),
                ColumnType::Unknown => String::new(),
            })
            .collect::<Vec<_>>()
            .join(&DELIMITER.to_string())
    }
}

/// Vertex table reader
pub struct VertexCsvReader;

impl VertexCsvReader {
    /// Read a whole vertex table. A missing file is an error.
    pub fn read_table<P: AsRef<Path>>(path: P) -> Result<VertexTable> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(IoError::ParseError {
                    line: 1,
                    message: "file is empty".to_string(),
                }
                .into())
            }
        };
        let schema = CsvSchema::from_header_line(&header)?;
        debug!("Vertex table columns: {:?}", schema.columns);

        let mut table = VertexTable::new();
        for (i, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            // header is line 1
            table.push(Self::parse_line(&line, &schema, i + 2)?);
        }

        info!("Loaded {} rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load the position matrix and, if requested, the colour matrix
    pub fn read_points<P: AsRef<Path>>(path: P, with_colors: bool) -> Result<PointSet> {
        Self::read_table(path)?.to_point_set(with_colors)
    }

    fn parse_line(line: &str, schema: &CsvSchema, line_no: usize) -> std::result::Result<VertexRecord, IoError> {
        let fields = split_fields(line);
        if fields.len() != schema.columns.len() {
            return Err(IoError::ParseError {
                line: line_no,
                message: format!(
                    "expected {} columns, found {}",
                    schema.columns.len(),
                    fields.len()
                ),
            });
        }

        let field = |column: ColumnType| schema.index_of(column).map(|i| fields[i].trim());

        let parse_f32 = |column: ColumnType| -> std::result::Result<Option<f32>, IoError> {
            field(column)
                .map(|s| {
                    s.parse::<f32>().map_err(|_| IoError::ParseError {
                        line: line_no,
                        message: format!("invalid {} value '{}'", column.header_name(), s),
                    })
                })
                .transpose()
        };

        let parse_index = |column: ColumnType| -> std::result::Result<usize, IoError> {
            field(column)
                .map(|s| {
                    s.parse::<usize>().map_err(|_| IoError::ParseError {
                        line: line_no,
                        message: format!("invalid {} value '{}'", column.header_name(), s),
                    })
                })
                .transpose()
                .map(|v| v.unwrap_or(0))
        };

        // x, y and z are guaranteed by the header check
        let x = parse_f32(ColumnType::X)?.unwrap_or_default();
        let y = parse_f32(ColumnType::Y)?.unwrap_or_default();
        let z = parse_f32(ColumnType::Z)?.unwrap_or_default();

        let mut record = VertexRecord::new(
            schema
                .index_of(ColumnType::ObjectName)
                .map(|i| fields[i].clone())
                .unwrap_or_default(),
            parse_index(ColumnType::FaceIndex)?,
            parse_index(ColumnType::VertexIndex)?,
            Point3f::new(x, y, z),
        );

        if let (Some(r), Some(g), Some(b)) = (
            parse_f32(ColumnType::Red)?,
            parse_f32(ColumnType::Green)?,
            parse_f32(ColumnType::Blue)?,
        ) {
            record.color = Some([r, g, b]);
        }

        Ok(record)
    }
}
