use crate::error::{GradeError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One student's entry from the roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub repo_url: String,
    pub script_dir: String,
    pub script_file: String,
}

impl Submission {
    /// Script location relative to the repository root.
    pub fn script_path(&self) -> String {
        let dir = self.script_dir.trim_end_matches('/');
        if dir.is_empty() || dir == "." {
            self.script_file.clone()
        } else {
            format!("{}/{}", dir, self.script_file)
        }
    }
}

#[derive(Debug)]
pub enum RosterEntry {
    Submission(Submission),
    /// Wrong field count; carries a `GradeError::MalformedRow`
    Malformed(GradeError),
}

/// Read the roster file. I/O and decoding errors are fatal; bad rows are not.
pub fn read_roster(path: &Path) -> Result<Vec<RosterEntry>> {
    let file = File::open(path).map_err(|e| GradeError::Roster {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_roster(file).map_err(|e| match e {
        GradeError::Roster { reason, .. } => GradeError::Roster {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}

/// Parse headerless comma-separated rows of `name, repo_url, script_dir, script_file`.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<RosterEntry>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| GradeError::Roster {
            path: Default::default(),
            reason: e.to_string(),
        })?;
        let fields: Vec<&str> = record.iter().map(str::trim).collect();

        if fields.len() != 4 {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            entries.push(RosterEntry::Malformed(GradeError::MalformedRow {
                line,
                fields: fields.len(),
                raw: fields.join(","),
            }));
            continue;
        }

        entries.push(RosterEntry::Submission(Submission {
            name: fields[0].to_string(),
            repo_url: fields[1].to_string(),
            script_dir: fields[2].to_string(),
            script_file: fields[3].to_string(),
        }));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_rows_are_trimmed() {
        let input = "Kim Min-su , https://github.com/kim/setup.git , scripts , install.sh\n";
        let entries = parse_roster(input.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        match &entries[0] {
            RosterEntry::Submission(s) => {
                assert_eq!(s.name, "Kim Min-su");
                assert_eq!(s.repo_url, "https://github.com/kim/setup.git");
                assert_eq!(s.script_path(), "scripts/install.sh");
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_field_counts_are_malformed() {
        let input = "a,b,c\n\
                     a,b,c,d,e\n\
                     Lee,https://example.com/lee.git,.,setup.sh\n";
        let entries = parse_roster(input.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(matches!(
            entries[0],
            RosterEntry::Malformed(GradeError::MalformedRow { fields: 3, line: 1, .. })
        ));
        assert!(matches!(
            entries[1],
            RosterEntry::Malformed(GradeError::MalformedRow { fields: 5, .. })
        ));
        match &entries[2] {
            RosterEntry::Submission(s) => assert_eq!(s.script_path(), "setup.sh"),
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = read_roster(Path::new("/nonexistent/submissions.txt")).unwrap_err();
        assert!(err.is_fatal());
    }
}
