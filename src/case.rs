//! Identifier case conversion: the convention's lower-first transform, plus snake/camel for wire keys.

/// Lower-case the first character, leave the rest unchanged.
/// e.g. "Book" -> "book", "BookStore" -> "bookStore", "URL" -> "uRL"
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.extend(first.to_lowercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Convert a single identifier from snake_case to camelCase.
/// e.g. "publish_date" -> "publishDate"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "publishDate" -> "publish_date"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_first_only_touches_the_first_char() {
        assert_eq!(lower_first("Book"), "book");
        assert_eq!(lower_first("BookStore"), "bookStore");
        assert_eq!(lower_first("URL"), "uRL");
        assert_eq!(lower_first("book"), "book");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn snake_and_camel() {
        assert_eq!(to_camel_case("publish_date"), "publishDate");
        assert_eq!(to_snake_case("publishDate"), "publish_date");
        assert_eq!(to_snake_case("name"), "name");
    }
}
