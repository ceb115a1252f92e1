use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

struct MemberRecord {
    range: Option<(u32, u32)>,
    original: String,
}

/// A parsed obfuscation rename table.
///
/// Top-level lines (`original -> obfuscated:`) rename classes and open the
/// class context for the indented member lines below them. Member lines
/// rename methods and fields within that context and may carry a
/// `start:end` line range, either prefixed to the signature (the classic
/// mapping-file layout) or suffixed to the obfuscated name.
///
/// Rename tables are best-effort by nature: lines that do not parse are
/// skipped, and lookups for unknown identifiers return the input unchanged.
pub struct ProguardMapping {
    classes: HashMap<String, String>,
    members: HashMap<String, HashMap<String, Vec<MemberRecord>>>,
    has_line_info: bool,
}

impl ProguardMapping {
    /// Parses a mapping from raw bytes.
    pub fn from_slice(slice: &[u8]) -> ProguardMapping {
        let mut mapping = ProguardMapping {
            classes: HashMap::new(),
            members: HashMap::new(),
            has_line_info: false,
        };

        let text = String::from_utf8_lossy(slice);
        let mut current_class: Option<String> = None;
        for line in text.lines() {
            let trimmed = line.trim_end();
            if trimmed.is_empty() || trimmed.trim_start().starts_with('#') {
                continue;
            }
            if trimmed.starts_with(char::is_whitespace) {
                match &current_class {
                    Some(class) => mapping.add_member(class.clone(), trimmed.trim_start()),
                    None => {
                        tracing::warn!("member line outside of a class context, skipping");
                    }
                }
            } else {
                current_class = mapping.add_class(trimmed);
            }
        }

        mapping
    }

    /// Reads and parses a mapping file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<ProguardMapping> {
        Ok(ProguardMapping::from_slice(&fs::read(path)?))
    }

    /// Registers a class line, returning the obfuscated name as the new
    /// member context.
    fn add_class(&mut self, line: &str) -> Option<String> {
        let (original, obfuscated) = split_arrow(line)?;
        let obfuscated = obfuscated.strip_suffix(':').unwrap_or(obfuscated);
        self.classes
            .insert(obfuscated.to_string(), original.to_string());
        Some(obfuscated.to_string())
    }

    fn add_member(&mut self, class: String, line: &str) {
        let Some((lhs, rhs)) = split_arrow(line) else {
            tracing::warn!(line, "unparseable member line, skipping");
            return;
        };

        // range prefixed to the signature: `10:20:int bar(int)`
        let (prefix_range, signature) = split_leading_range(lhs);
        // or suffixed to the obfuscated name: `b:10:20:`
        let (obfuscated, suffix_range) = split_trailing_range(rhs);

        let Some(original) = member_name(signature) else {
            tracing::warn!(line, "member line without a member name, skipping");
            return;
        };

        let range = prefix_range.or(suffix_range);
        if range.is_some() {
            self.has_line_info = true;
        }
        self.members
            .entry(class)
            .or_default()
            .entry(obfuscated.to_string())
            .or_default()
            .push(MemberRecord {
                range,
                original: original.to_string(),
            });
    }

    /// True iff at least one member record carries a line range.
    pub fn has_line_info(&self) -> bool {
        self.has_line_info
    }

    /// Resolves an obfuscated class name, or `None` if unknown.
    pub fn remap_class(&self, class: &str) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }

    /// Resolves an obfuscated `class` or `class:member` path.
    ///
    /// Member resolution picks the first record in file order whose line
    /// range contains `line`; without a `line` (or without any ranges on
    /// the records) the first record wins. A member miss falls back to
    /// resolving the class alone, and a full miss returns the input
    /// unchanged.
    pub fn remap(&self, path: &str, line: Option<u32>) -> String {
        let Some((class, member)) = path.split_once(':') else {
            return match self.remap_class(path) {
                Some(original) => original.to_string(),
                None => path.to_string(),
            };
        };

        let records = self.members.get(class).and_then(|m| m.get(member));
        let hit = records.and_then(|records| match line {
            Some(line) if records.iter().any(|r| r.range.is_some()) => records
                .iter()
                .find(|r| r.range.is_some_and(|(start, end)| start <= line && line <= end)),
            _ => records.first(),
        });

        let class_name = self.remap_class(class);
        match hit {
            Some(record) => format!("{}:{}", class_name.unwrap_or(class), record.original),
            None => match class_name {
                Some(class_name) => format!("{class_name}:{member}"),
                None => path.to_string(),
            },
        }
    }
}

fn split_arrow(line: &str) -> Option<(&str, &str)> {
    let (lhs, rhs) = line.split_once(" -> ")?;
    let (lhs, rhs) = (lhs.trim(), rhs.trim());
    if lhs.is_empty() || rhs.is_empty() {
        return None;
    }
    Some((lhs, rhs))
}

/// Splits a `start:end:` pair off the front of a member signature.
fn split_leading_range(lhs: &str) -> (Option<(u32, u32)>, &str) {
    let mut parts = lhs.splitn(3, ':');
    if let (Some(a), Some(b), Some(rest)) = (parts.next(), parts.next(), parts.next()) {
        if let (Ok(start), Ok(end)) = (a.parse(), b.parse()) {
            return (Some((start, end)), rest);
        }
    }
    (None, lhs)
}

/// Splits a `:start:end:` suffix off an obfuscated member name.
fn split_trailing_range(rhs: &str) -> (&str, Option<(u32, u32)>) {
    if let Some((name, rest)) = rhs.split_once(':') {
        let mut parts = rest.trim_end_matches(':').splitn(2, ':');
        if let (Some(a), Some(b)) = (parts.next(), parts.next()) {
            if let (Ok(start), Ok(end)) = (a.parse(), b.parse()) {
                return (name, Some((start, end)));
            }
        }
    }
    (rhs, None)
}

/// Extracts the member name from a signature like `int bar(int)`,
/// `void run()` or a field declaration like `int count`.
///
/// A trailing `:start:end` original-line annotation after the argument
/// list is tolerated and ignored.
fn member_name(signature: &str) -> Option<&str> {
    let head = match signature.find('(') {
        Some(paren) => &signature[..paren],
        None => match signature.split_once(':') {
            Some((head, _)) => head,
            None => signature,
        },
    };
    let name = head.split_whitespace().next_back()?;
    if name.is_empty() { None } else { Some(name) }
}
