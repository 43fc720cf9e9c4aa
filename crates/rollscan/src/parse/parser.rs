//! Regex cascade over the recognized text of one card.
//!
//! Extraction steps run in a fixed order and thread an explicit
//! remaining-lines working set: a line consumed by one field is excluded
//! from every later step, so a single OCR line can never populate two
//! fields. The parser is total; any input, including empty or garbled
//! text, yields a record with documented defaults.

use crate::parse::cleaners::{
    RELATION_NAME_WORDS, VOTER_NAME_WORDS, classify_gender, clean_age, clean_house_number,
    clean_person_name,
};
use crate::parse::normalize::normalize_id_candidate;
use crate::types::{CardRecord, RelationLabel};
use once_cell::sync::Lazy;
use regex::Regex;

static ID_WITH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z0-9]{5,})\s+(\d{1,2}/\d{1,2}/\d{2,4})").unwrap());
static ID_FALLBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{2,4}[0-9A-Z]{6,10}").unwrap());
static REG_NO: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{1,3}/[0-9]{1,3}/[0-9]{1,5}").unwrap());

static VOTER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"मतदार(?:ाचे)?\s*(?:पूर्ण\s*)?(?:नाव)?\s*[:ः]?\s*(.+)").unwrap());
static NAME_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"नाव\s*[:ः]?\s*(.+)").unwrap());
static RELATION_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"पती|वडिल|आई|सासू|पत्नी|सून").unwrap());
static OTHER_FIELD_KEYWORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"घर|लिंग|वय").unwrap());

static HUSBAND_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"पतीचे\s*नाव\s*[:ः]?\s*(.+)").unwrap());
static FATHER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"वडिल(?:ांचे|े)\s*नाव\s*[:ः]?\s*(.+)").unwrap());

static HOUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"घर\s*क्रमांक\s*[:ः]?\s*(.+)").unwrap());
static AGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"वय\s*[:ः]?\s*([\d०-९]+)").unwrap());
static GENDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"लिंग\s*[:ः]?\s*(\S+)").unwrap());

/// Parse the recognized text of one card into a record.
pub fn parse_card(text: &str) -> CardRecord {
    let mut record = CardRecord::default();
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let lines = extract_id(&mut record, lines);
    let lines = extract_voter_name(&mut record, lines);
    let _lines = extract_relation(&mut record, lines);
    // The labeled fields below are anchored by their own keywords and
    // search the full text, not the remaining working set.
    extract_house(&mut record, text);
    extract_age(&mut record, text);
    extract_gender(&mut record, text);

    record
}

/// Step 1: card ID plus issue date on the first line.
///
/// When the labeled form is absent, a confusable-repaired identifier
/// token anywhere in the text serves as fallback; the fallback runs over
/// the stripped concatenation of the whole text and consumes no lines. A
/// registration number of the form `d/d/d` is captured the same way.
fn extract_id<'a>(record: &mut CardRecord, lines: Vec<&'a str>) -> Vec<&'a str> {
    let mut remaining = lines;

    if let Some(first) = remaining.first()
        && let Some(caps) = ID_WITH_DATE.captures(first)
    {
        record.id = format!("{} {}", &caps[1], &caps[2]);
        remaining.remove(0);
    }

    let repaired = normalize_id_candidate(&remaining.join("\n"));
    if record.id.is_empty()
        && let Some(m) = ID_FALLBACK.find(&repaired)
    {
        record.id = m.as_str().to_string();
    }
    if let Some(m) = REG_NO.find(&repaired) {
        record.reg_no = m.as_str().to_string();
    }

    remaining
}

/// Step 2: voter name, labeled pattern first, generic "name" line fallback.
fn extract_voter_name<'a>(record: &mut CardRecord, lines: Vec<&'a str>) -> Vec<&'a str> {
    let mut consumed = None;

    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = VOTER_NAME.captures(line) {
            record.voter_name = clean_person_name(&caps[1], VOTER_NAME_WORDS);
            consumed = Some(i);
            break;
        }
    }

    if consumed.is_none() {
        for (i, line) in lines.iter().enumerate() {
            if RELATION_KEYWORDS.is_match(line) || OTHER_FIELD_KEYWORDS.is_match(line) {
                continue;
            }
            if let Some(caps) = NAME_KEYWORD.captures(line) {
                record.voter_name = clean_person_name(&caps[1], VOTER_NAME_WORDS);
                consumed = Some(i);
                break;
            }
        }
    }

    drop_consumed(lines, consumed)
}

/// Step 3: relation name.
///
/// The first line carrying either relation label wins; within a line the
/// husband label is checked before the father label.
fn extract_relation<'a>(record: &mut CardRecord, lines: Vec<&'a str>) -> Vec<&'a str> {
    let mut consumed = None;

    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = HUSBAND_NAME.captures(line) {
            record.relation_label = RelationLabel::Husband;
            record.relation_name = clean_person_name(&caps[1], RELATION_NAME_WORDS);
            consumed = Some(i);
            break;
        }
        if let Some(caps) = FATHER_NAME.captures(line) {
            record.relation_label = RelationLabel::Father;
            record.relation_name = clean_person_name(&caps[1], RELATION_NAME_WORDS);
            consumed = Some(i);
            break;
        }
    }

    drop_consumed(lines, consumed)
}

/// Step 4: house number.
fn extract_house(record: &mut CardRecord, text: &str) {
    if let Some(caps) = HOUSE.captures(text) {
        record.house = clean_house_number(&caps[1]);
    }
}

/// Step 5: age.
fn extract_age(record: &mut CardRecord, text: &str) {
    if let Some(caps) = AGE.captures(text) {
        record.age = clean_age(&caps[1]);
    }
}

/// Step 6: gender, masculine fallback.
fn extract_gender(record: &mut CardRecord, text: &str) {
    if let Some(caps) = GENDER.captures(text) {
        let (code, full) = classify_gender(&caps[1]);
        record.gender_code = code.to_string();
        record.gender_full = full.to_string();
    }
}

fn drop_consumed(mut lines: Vec<&str>, consumed: Option<usize>) -> Vec<&str> {
    if let Some(i) = consumed {
        lines.remove(i);
    }
    lines
}
