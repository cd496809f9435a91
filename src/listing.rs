//! Classic long-form directory listing parser

use chrono::{Datelike, Local, NaiveDate};

use crate::error::{Result, SpiderError};

/// One named entry from a directory listing, dated to day granularity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub modified: NaiveDate,
}

/// Parse one "list current directory" response into (dirs, files).
///
/// Lines look like:
///
/// ```text
/// -rw-r--r--   1 ftp      ftp          1599 Apr  3  2002 author.msg
/// drwxr-xr-x   9 ftp      ftp           368 Jun  9  2010 pub
/// ```
///
/// Entries keep their listing order. Servers report `HH:MM` instead of
/// a year for entries newer than about six months; the current year is
/// substituted before parsing, and both forms truncate to day
/// granularity. Symlink entries (`name -> target`) never surface in
/// the file list.
///
/// A line with fewer than nine tokens, or an unparseable date, fails
/// the whole parse; the caller decides whether to skip the directory
/// or abort.
pub fn parse_listing(lines: &[String]) -> Result<(Vec<ListingEntry>, Vec<ListingEntry>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    let this_year = Local::now().year();

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 9 {
            return Err(SpiderError::MalformedListing {
                line: line.to_string(),
            });
        }

        let perms = tokens[0];
        let name = tokens[8..].join(" ");

        // Recent entries carry HH:MM in place of the year.
        let year;
        let year_token = if tokens[7].contains(':') {
            year = this_year.to_string();
            year.as_str()
        } else {
            tokens[7]
        };

        let date_str = format!("{} {} {}", tokens[5], tokens[6], year_token);
        let modified = NaiveDate::parse_from_str(&date_str, "%b %d %Y").map_err(|_| {
            SpiderError::MalformedListing {
                line: line.to_string(),
            }
        })?;

        if perms.starts_with('d') {
            dirs.push(ListingEntry { name, modified });
        } else if !name.contains("->") {
            files.push(ListingEntry { name, modified });
        }
    }

    Ok((dirs, files))
}
