use std::collections::{BTreeMap, BTreeSet};

use super::columns::{column_def, FilterKind};
use super::model::{CellField, CellSpec, FieldValue};

// ---------------------------------------------------------------------------
// Locale-tolerant number parsing
// ---------------------------------------------------------------------------

/// Parse user-entered or stored numeric text.
///
/// The first `,` is read as a decimal separator (`"9,5"` → 9.5). After
/// leading whitespace the longest numeric prefix is taken, so trailing
/// units or junk are ignored (`"12 Ah"` → 12). Returns `None` when no
/// number can be read at all.
pub fn parse_locale_number(text: &str) -> Option<f64> {
    let normalized = text.replacen(',', ".", 1);
    let s = normalized.trim_start();

    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    if unsigned.starts_with("Infinity") {
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let len = numeric_prefix_len(unsigned);
    if len == 0 {
        return None;
    }
    let value: f64 = unsigned[..len].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Length of the leading `digits[.digits][e[+-]digits]` run.
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let int_digits = digits_from(0);
    let mut end = int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_digits = digits_from(exp.min(bytes.len()));
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    end
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Case-insensitive full-string equality. An empty or missing criterion
/// accepts everything; a missing value never matches an active criterion.
pub fn equals_string(value: FieldValue<'_>, criterion: Option<&str>) -> bool {
    let Some(criterion) = criterion.filter(|c| !c.is_empty()) else {
        return true;
    };
    if value.is_null() {
        return false;
    }
    value.to_string().to_lowercase() == criterion.to_lowercase()
}

/// Case-insensitive substring match, used by free-text columns.
pub fn includes_string(value: FieldValue<'_>, criterion: Option<&str>) -> bool {
    let Some(criterion) = criterion.filter(|c| !c.is_empty()) else {
        return true;
    };
    if value.is_null() {
        return false;
    }
    value
        .to_string()
        .to_lowercase()
        .contains(&criterion.to_lowercase())
}

/// Min/max text pair entered for a numeric column. Either side may be
/// missing or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeCriterion {
    pub min: Option<String>,
    pub max: Option<String>,
}

impl RangeCriterion {
    /// Both sides missing or empty.
    pub fn is_blank(&self) -> bool {
        self.min.as_deref().map_or(true, str::is_empty)
            && self.max.as_deref().map_or(true, str::is_empty)
    }
}

fn parse_bound(raw: Option<&str>) -> Option<f64> {
    raw.filter(|s| !s.is_empty())
        .and_then(parse_locale_number)
        .filter(|v| !v.is_nan())
}

/// Inclusive numeric range membership.
///
/// A missing criterion accepts everything. A missing, empty or
/// unparseable value is rejected. Each bound is applied only if it parses;
/// the two bounds are checked independently of each other.
pub fn in_number_range(value: FieldValue<'_>, criterion: Option<&RangeCriterion>) -> bool {
    let Some(criterion) = criterion else {
        return true;
    };

    let value = match value {
        FieldValue::Null | FieldValue::Text("") => return false,
        FieldValue::Number(n) => n,
        FieldValue::Text(s) => match parse_locale_number(s) {
            Some(n) => n,
            None => return false,
        },
    };
    if value.is_nan() {
        return false;
    }

    if let Some(min) = parse_bound(criterion.min.as_deref()) {
        if value < min {
            return false;
        }
    }
    if let Some(max) = parse_bound(criterion.max.as_deref()) {
        if value > max {
            return false;
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Per-column filter state
// ---------------------------------------------------------------------------

/// The criterion entered for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Range(RangeCriterion),
}

/// Active column filters. Empty criteria are removed instead of stored,
/// so a column without an entry accepts every row.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilters {
    active: BTreeMap<CellField, FilterValue>,
}

impl ColumnFilters {
    pub fn get(&self, field: CellField) -> Option<&FilterValue> {
        self.active.get(&field)
    }

    pub fn text(&self, field: CellField) -> Option<&str> {
        match self.active.get(&field) {
            Some(FilterValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn range(&self, field: CellField) -> Option<&RangeCriterion> {
        match self.active.get(&field) {
            Some(FilterValue::Range(r)) => Some(r),
            _ => None,
        }
    }

    pub fn set_text(&mut self, field: CellField, text: String) {
        if text.is_empty() {
            self.active.remove(&field);
        } else {
            self.active.insert(field, FilterValue::Text(text));
        }
    }

    pub fn set_range(&mut self, field: CellField, range: RangeCriterion) {
        if range.is_blank() {
            self.active.remove(&field);
        } else {
            self.active.insert(field, FilterValue::Range(range));
        }
    }

    pub fn clear(&mut self, field: CellField) {
        self.active.remove(&field);
    }

    pub fn clear_all(&mut self) {
        self.active.clear();
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Whether `cell` passes every active filter.
    pub fn accepts(&self, cell: &CellSpec) -> bool {
        self.active.iter().all(|(&field, criterion)| {
            let value = cell.get(field);
            match criterion {
                FilterValue::Range(range) => in_number_range(value, Some(range)),
                FilterValue::Text(text) => match column_def(field).filter {
                    FilterKind::IncludesString => includes_string(value, Some(text)),
                    _ => equals_string(value, Some(text)),
                },
            }
        })
    }
}

/// Return indices of cells that pass all active filters.
pub fn filtered_indices(cells: &[CellSpec], filters: &ColumnFilters) -> Vec<usize> {
    cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| filters.accepts(cell))
        .map(|(i, _)| i)
        .collect()
}

/// Sorted distinct present values per exact-match column, for dropdowns.
///
/// Values differing only in case collapse onto the first spelling seen,
/// matching the case-insensitive exact-match filter.
pub fn distinct_values(cells: &[CellSpec]) -> BTreeMap<CellField, BTreeSet<String>> {
    let mut out: BTreeMap<CellField, BTreeSet<String>> = BTreeMap::new();
    for field in CellField::ALL {
        if column_def(field).filter != FilterKind::EqualsString {
            continue;
        }
        let mut seen = BTreeSet::new();
        let values = out.entry(field).or_default();
        for cell in cells {
            if let FieldValue::Text(s) = cell.get(field) {
                if seen.insert(s.to_lowercase()) {
                    values.insert(s.to_string());
                }
            }
        }
    }
    out
}
