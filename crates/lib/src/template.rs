//! A minimal `{{.Field}}` output template.
//!
//! The vocabulary is a fixed table of [`Field`]s per row type, so the set of
//! valid placeholders and the derived column headers are known statically.
//! A template starting with the `table` keyword also renders a header row,
//! and tab-separated cells are aligned into columns.

use std::sync::LazyLock;

use anyhow::Result;
use comfy_table::presets::NOTHING;
use comfy_table::Table;
use regex::Regex;

/// Spaces between aligned columns.
const COLUMN_PADDING: u16 = 3;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*\.(\w+)\s*\}\}").expect("valid placeholder regex"));

/// One substitutable field of a row type `R`.
pub struct Field<R> {
    /// Placeholder name, as in `{{.Name}}`
    pub name: &'static str,
    /// Column header; `None` derives it from `name`
    pub header: Option<&'static str>,
    /// Extract the rendered value
    pub get: fn(&R) -> &str,
}

impl<R> std::fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}

impl<R> Field<R> {
    /// The column header for this field.
    pub fn header(&self) -> String {
        derive_header(self.header.unwrap_or(self.name))
    }
}

/// Split a field name on word boundaries and upper-case it, so `ImageID`
/// becomes `IMAGE ID`. A boundary is a lower-to-upper transition, or the
/// last capital of an acronym that starts a new word (`HTTPServer`).
pub fn derive_header(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut r = String::with_capacity(name.len() + 2);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_lower) {
                r.push(' ');
            }
        }
        r.extend(c.to_uppercase());
    }
    r
}

enum Segment<R: 'static> {
    Literal(String),
    Field(&'static Field<R>),
}

impl<R: 'static> std::fmt::Debug for Segment<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Segment::Field(field) => f.debug_tuple("Field").field(field).finish(),
        }
    }
}

/// A parsed template for rows of type `R`.
pub struct Template<R: 'static> {
    segments: Vec<Segment<R>>,
    table: bool,
}

impl<R: 'static> std::fmt::Debug for Template<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("segments", &self.segments)
            .field("table", &self.table)
            .finish()
    }
}

impl<R: 'static> Template<R> {
    /// Parse `src` against the vocabulary `fields`. A literal `\t` (backslash
    /// followed by `t`) is treated as a tab, since shells rarely pass real tabs.
    pub fn parse(src: &str, fields: &'static [Field<R>]) -> Result<Self> {
        let src = src.replace(r"\t", "\t");
        let (table, body) = match src.strip_prefix("table") {
            Some(rest) => (true, rest.trim_start_matches([' ', '\t'])),
            None => (false, src.as_str()),
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(body) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            let field = fields.iter().find(|f| f.name == name).ok_or_else(|| {
                let valid = fields.iter().map(|f| f.name).collect::<Vec<_>>();
                anyhow::anyhow!(
                    "Unknown template field {name:?}; valid fields: {}",
                    valid.join(", ")
                )
            })?;
            push_literal(&mut segments, &body[last..whole.start()])?;
            segments.push(Segment::Field(field));
            last = whole.end();
        }
        push_literal(&mut segments, &body[last..])?;
        Ok(Self { segments, table })
    }

    /// Whether the template requested a header row.
    pub fn has_header(&self) -> bool {
        self.table
    }

    /// Render the header row: each placeholder replaced by its column header.
    pub fn render_header(&self) -> String {
        self.expand(|f| f.header())
    }

    /// Render one row.
    pub fn render(&self, row: &R) -> String {
        self.expand(|f| (f.get)(row).to_string())
    }

    fn expand(&self, mut value: impl FnMut(&Field<R>) -> String) -> String {
        let mut r = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => r.push_str(s),
                Segment::Field(f) => r.push_str(&value(f)),
            }
        }
        r
    }
}

fn push_literal<R: 'static>(segments: &mut Vec<Segment<R>>, s: &str) -> Result<()> {
    if s.contains("{{") {
        anyhow::bail!("Malformed template action in {s:?}");
    }
    if !s.is_empty() {
        segments.push(Segment::Literal(s.to_string()));
    }
    Ok(())
}

/// Align tab-separated cells into columns, like a tab writer: every cell
/// followed by a tab is padded to its column width plus a fixed gap, and
/// trailing whitespace is dropped. Output lines without any tab pass through.
pub fn align_columns<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = lines
        .into_iter()
        .flat_map(|l| {
            l.as_ref()
                .split('\n')
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .collect();
    if !lines.iter().any(|l| l.contains('\t')) {
        return lines;
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    for line in &lines {
        table.add_row(line.split('\t').collect::<Vec<_>>());
    }
    for column in table.column_iter_mut() {
        column.set_padding((0, COLUMN_PADDING));
    }
    table.lines().map(|l| l.trim_end().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: String,
        kind: String,
    }

    static FIELDS: &[Field<Row>] = &[
        Field {
            name: "Name",
            header: None,
            get: |r| &r.name,
        },
        Field {
            name: "Kind",
            header: Some("ObjectKind"),
            get: |r| &r.kind,
        },
    ];

    fn row(name: &str, kind: &str) -> Row {
        Row {
            name: name.into(),
            kind: kind.into(),
        }
    }

    #[test]
    fn test_derive_header() {
        let cases = [
            ("Repository", "REPOSITORY"),
            ("ImageID", "IMAGE ID"),
            ("Created", "CREATED"),
            ("SharedSize", "SHARED SIZE"),
            ("HTTPServer", "HTTP SERVER"),
            ("ID", "ID"),
        ];
        for (input, expected) in cases {
            assert_eq!(derive_header(input), expected);
        }
        assert_eq!(FIELDS[1].header(), "OBJECT KIND");
    }

    #[test]
    fn test_parse_render() {
        let t = Template::parse("{{.Name}} is {{ .Kind }}!", FIELDS).unwrap();
        assert!(!t.has_header());
        assert_eq!(t.render(&row("a", "b")), "a is b!");
        assert_eq!(t.render_header(), "NAME is OBJECT KIND!");
    }

    #[test]
    fn test_table_keyword_and_tab_escape() {
        let t = Template::parse(r"table {{.Name}}\t{{.Kind}}", FIELDS).unwrap();
        assert!(t.has_header());
        assert_eq!(t.render(&row("a", "b")), "a\tb");
        assert_eq!(t.render_header(), "NAME\tOBJECT KIND");
    }

    #[test]
    fn test_parse_errors() {
        let err = Template::parse("{{.Nope}}", FIELDS).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Nope"), "{msg}");
        assert!(msg.contains("Name, Kind"), "{msg}");
        assert!(Template::parse("{{.Name", FIELDS).is_err());
        assert!(Template::parse("{{ Name }}", FIELDS).is_err());
    }

    #[test]
    fn test_align_columns() {
        let lines = align_columns(["NAME\tKIND\t", "averylongname\tx\t", "b\tyy\t"]);
        assert_eq!(lines.len(), 3);
        // Every column starts at the same offset on each line
        let kind_col = lines[0].find("KIND").unwrap();
        assert_eq!(kind_col, "averylongname".len() + COLUMN_PADDING as usize);
        assert_eq!(lines[1].find('x').unwrap(), kind_col);
        assert_eq!(lines[2].find("yy").unwrap(), kind_col);
        assert!(lines.iter().all(|l| !l.ends_with(' ')));
        assert!(lines[2].starts_with("b "));
    }

    #[test]
    fn test_align_columns_passthrough() {
        let lines = align_columns(["abc", "de"]);
        assert_eq!(lines, ["abc", "de"]);
    }
}
