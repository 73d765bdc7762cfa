/// Extract the bare address from `"Display Name <addr>"`.
///
/// Values without `<` are returned verbatim. A `<` with no closing `>` keeps
/// everything after the `<`.
pub fn canonical_address(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let Some(open) = raw.find('<') else {
        return Some(raw.to_string());
    };

    let rest = &raw[open + 1..];
    let inner = match rest.find('>') {
        Some(close) => &rest[..close],
        None => rest,
    };
    Some(inner.to_string())
}

/// Pick the display name for a participant.
///
/// A name embedded before `<` in the raw field wins. Otherwise the supplied
/// candidate is used only when it contains `@`; a plain-text candidate is
/// dropped. A `<` at position 0 never counts as an embedded name.
pub fn display_name(raw: Option<&str>, candidate: Option<&str>) -> Option<String> {
    if let Some(raw) = raw {
        if let Some(end) = raw.find('<').filter(|&end| end > 0) {
            let name = raw[..end].trim_end();
            return (!name.is_empty()).then(|| name.to_string());
        }
    }

    candidate
        .filter(|name| name.contains('@'))
        .map(str::to_string)
}
