// Copyright 2025 Cowboy AI, LLC.

//! Domain-name syntax.
//!
//! Names arrive in ASCII-compatible form: lower-case letters, digits, dashes and dots, with
//! internationalised labels already encoded as `xn--` punycode. Checks run in a fixed order and
//! the first failure is reported.

use crate::errors::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};

/// Maximum label length in characters
pub const MAX_LABEL_LENGTH: usize = 63;

/// Prefix of an ASCII-compatible encoded label
pub const ACE_PREFIX: &str = "xn--";

/// Code-point tables a decoded IDN label must fit into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdnTable {
    /// ASCII letters and digits plus the Latin-1 and Latin Extended-A letters
    ExtendedLatin,
    /// ASCII letters and digits plus hiragana, katakana and common kanji
    Japanese,
}

impl IdnTable {
    /// Table name recorded on the domain
    pub fn name(&self) -> &'static str {
        match self {
            IdnTable::ExtendedLatin => "extended_latin",
            IdnTable::Japanese => "japanese",
        }
    }

    /// Whether every character of the label is in this table
    pub fn accepts(&self, label: &str) -> bool {
        label.chars().all(|c| self.contains(c))
    }

    fn contains(&self, c: char) -> bool {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            return true;
        }
        let cp = c as u32;
        match self {
            IdnTable::ExtendedLatin => {
                ((0x00DF..=0x00FF).contains(&cp) && cp != 0x00F7)
                    || (0x0100..=0x017F).contains(&cp)
            }
            IdnTable::Japanese => {
                (0x3041..=0x3096).contains(&cp)
                    || (0x309D..=0x309F).contains(&cp)
                    || (0x30A1..=0x30FA).contains(&cp)
                    || (0x30FC..=0x30FE).contains(&cp)
                    || (0x3005..=0x3007).contains(&cp)
                    || (0x4E00..=0x9FFF).contains(&cp)
            }
        }
    }
}

/// A syntactically valid domain name split into label and TLD
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainName {
    label: String,
    tld: String,
}

impl DomainName {
    /// The first label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The TLD the name sits under
    pub fn tld(&self) -> &str {
        &self.tld
    }

    /// `label.tld`
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.label, self.tld)
    }
}

impl std::fmt::Display for DomainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.label, self.tld)
    }
}

/// Longest configured TLD that is a proper suffix of `name`.
///
/// Pure lookup; used both by validation and by the coordinator to decide which policy to load.
pub fn find_tld<'a, S: AsRef<str>>(name: &str, tlds: &'a [S]) -> Option<&'a str> {
    let mut rest = name;
    while let Some(dot) = rest.find('.') {
        rest = &rest[dot + 1..];
        if let Some(tld) = tlds.iter().map(AsRef::as_ref).find(|t| *t == rest) {
            return Some(tld);
        }
    }
    None
}

/// Parse `name` against the configured TLDs: characters, parts, TLD, then the label rules.
pub fn parse_domain_name<S: AsRef<str>>(name: &str, tlds: &[S]) -> FlowResult<DomainName> {
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(FlowError::BadDomainNameCharacter {
            name: name.to_string(),
        });
    }
    let parts: Vec<&str> = name.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(FlowError::EmptyDomainNamePart);
    }
    if parts.len() <= 1 {
        return Err(FlowError::BadDomainNamePartsCount {
            name: name.to_string(),
        });
    }
    if tlds.iter().any(|t| t.as_ref() == name) {
        return Err(FlowError::DomainNameExistsAsTld {
            name: name.to_string(),
        });
    }
    let tld = find_tld(name, tlds).ok_or_else(|| FlowError::TldDoesNotExist {
        tld: parts[1..].join("."),
    })?;
    if parts.len() != tld.split('.').count() + 1 {
        return Err(FlowError::BadDomainNamePartsCount {
            name: name.to_string(),
        });
    }
    let label = parts[0];
    validate_label(label)?;
    Ok(DomainName {
        label: label.to_string(),
        tld: tld.to_string(),
    })
}

/// Length and dash placement for one ASCII label.
pub fn validate_label(label: &str) -> FlowResult<()> {
    if label.len() > MAX_LABEL_LENGTH {
        return Err(FlowError::DomainLabelTooLong);
    }
    if label.starts_with('-') {
        return Err(FlowError::LeadingDash);
    }
    if label.ends_with('-') {
        return Err(FlowError::TrailingDash);
    }
    if label.get(2..4) == Some("--") && !label.starts_with(ACE_PREFIX) {
        return Err(FlowError::DashesInThirdAndFourth);
    }
    Ok(())
}

/// Decode an `xn--` label and check it against the TLD's IDN tables.
///
/// Plain ASCII labels pass through. The decoded form must contain non-ASCII characters and
/// must map back to the same ACE label under IDNA processing.
pub fn validate_idn_label(label: &str, tables: &[IdnTable]) -> FlowResult<String> {
    let unicode = match label.strip_prefix(ACE_PREFIX) {
        Some(encoded) => {
            let decoded =
                idna::punycode::decode_to_string(encoded).ok_or(FlowError::InvalidPunycode)?;
            if decoded.is_ascii() {
                return Err(FlowError::InvalidPunycode);
            }
            match idna::domain_to_ascii(&decoded) {
                Ok(ascii) if ascii == label => decoded,
                _ => return Err(FlowError::InvalidPunycode),
            }
        }
        None => label.to_string(),
    };
    if tables.iter().any(|table| table.accepts(&unicode)) {
        Ok(unicode)
    } else {
        Err(FlowError::InvalidIdnDomainLabel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const TLDS: &[&str] = &["tld", "foo.tld", "xn--q9jyb4c"];

    #[test_case("Example.tld" ; "uppercase")]
    #[test_case("FOO.TLD" ; "uppercase existing tld")]
    #[test_case("exam_ple.tld" ; "underscore")]
    #[test_case("exa mple.tld" ; "space")]
    fn rejects_bad_characters(name: &str) {
        assert!(matches!(
            parse_domain_name(name, TLDS),
            Err(FlowError::BadDomainNameCharacter { .. })
        ));
    }

    #[test_case(".example.tld", FlowError::EmptyDomainNamePart ; "leading dot")]
    #[test_case("foo..tld", FlowError::EmptyDomainNamePart ; "double dot")]
    #[test_case("tld", FlowError::BadDomainNamePartsCount { name: "tld".into() } ; "bare tld")]
    #[test_case("foo.tld", FlowError::DomainNameExistsAsTld { name: "foo.tld".into() } ; "name is a tld")]
    #[test_case("a.b.tld", FlowError::BadDomainNamePartsCount { name: "a.b.tld".into() } ; "too many parts")]
    #[test_case("foo.nosuchtld", FlowError::TldDoesNotExist { tld: "nosuchtld".into() } ; "unknown tld")]
    #[test_case("-foo.tld", FlowError::LeadingDash ; "leading dash")]
    #[test_case("foo-.tld", FlowError::TrailingDash ; "trailing dash")]
    #[test_case("ab--cdefg.tld", FlowError::DashesInThirdAndFourth ; "dashes in three and four")]
    fn rejects_structure(name: &str, expected: FlowError) {
        assert_eq!(parse_domain_name(name, TLDS), Err(expected));
    }

    #[test]
    fn rejects_long_label() {
        let name = format!("{}.tld", "a".repeat(64));
        assert_eq!(
            parse_domain_name(&name, TLDS),
            Err(FlowError::DomainLabelTooLong)
        );
        let ok = format!("{}.tld", "a".repeat(63));
        assert!(parse_domain_name(&ok, TLDS).is_ok());
    }

    #[test]
    fn accepts_multipart_tld() {
        let name = parse_domain_name("example.foo.tld", TLDS).unwrap();
        assert_eq!(name.label(), "example");
        assert_eq!(name.tld(), "foo.tld");
        assert_eq!(name.fqdn(), "example.foo.tld");
    }

    #[test]
    fn short_label_on_idn_tld() {
        let name = parse_domain_name("osx.xn--q9jyb4c", TLDS).unwrap();
        assert_eq!(name.tld(), "xn--q9jyb4c");
    }

    #[test]
    fn idn_labels() {
        let tables = [IdnTable::ExtendedLatin, IdnTable::Japanese];
        assert_eq!(
            validate_idn_label("xn--mnchen-3ya", &tables).unwrap(),
            "münchen"
        );
        assert_eq!(validate_idn_label("xn--q9jyb4c", &tables).unwrap(), "みんな");
        assert_eq!(validate_idn_label("example", &tables).unwrap(), "example");
        assert_eq!(
            validate_idn_label("xn--9", &tables),
            Err(FlowError::InvalidPunycode)
        );
        // Cyrillic is outside both tables.
        assert_eq!(
            validate_idn_label("xn--e1afmkfd", &tables),
            Err(FlowError::InvalidIdnDomainLabel)
        );
        assert_eq!(
            validate_idn_label("xn--mnchen-3ya", &[IdnTable::Japanese]),
            Err(FlowError::InvalidIdnDomainLabel)
        );
    }

    #[test]
    fn find_tld_prefers_longest_suffix() {
        assert_eq!(find_tld("a.foo.tld", TLDS), Some("foo.tld"));
        assert_eq!(find_tld("a.tld", TLDS), Some("tld"));
        assert_eq!(find_tld("tld", TLDS), None);
    }
}
