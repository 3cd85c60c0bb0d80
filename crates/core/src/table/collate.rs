use std::cmp::Ordering;

/// Compare two strings the way a Portuguese/English UI collator would.
///
/// Three levels, first difference wins:
/// 1. base letters, ignoring case and Latin-1 accents (`"álvaro" < "ana"`);
/// 2. accents (`"e" < "é"`);
/// 3. case, lowercase first (`"a" < "A"`).
///
/// Falls back to code-point order so distinct strings never compare equal
/// unless identical.
#[must_use]
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    primary_keys(a)
        .cmp(primary_keys(b))
        .then_with(|| lowered(a).cmp(lowered(b)))
        .then_with(|| case_keys(a).cmp(case_keys(b)))
        .then_with(|| a.cmp(b))
}

fn lowered(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

fn primary_keys(s: &str) -> impl Iterator<Item = char> + '_ {
    lowered(s).map(strip_accent)
}

/// `false` for lowercase so lowercase sorts first.
fn case_keys(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars().map(char::is_uppercase)
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
