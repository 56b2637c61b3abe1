// Reserved-word field aliasing
//
// Some canonical schema field names collide with host-language reserved
// words (or did in the legacy host). Those fields are exposed under a
// fixed alias at the accessor boundary while always being stored under the
// canonical schema name. The table is static, bidirectional and total: a
// name absent from it maps to itself in both directions.

/// Canonical schema name paired with its accessor alias.
const RESERVED_ALIASES: &[(&str, &str)] = &[
    ("box", "box_"),
    ("fn", "fn_"),
    ("impl", "impl_"),
    ("loop", "loop_"),
    ("match", "match_"),
    ("move", "move_"),
    ("pass", "pass_"),
    ("ref", "ref_"),
    ("self", "self_"),
    ("type", "type_"),
    ("use", "use_"),
    ("where", "where_"),
];

/// Maps an accessor name to the canonical storage name.
pub fn to_canonical(name: &str) -> &str {
    RESERVED_ALIASES
        .iter()
        .find(|(_, alias)| *alias == name)
        .map_or(name, |(canonical, _)| *canonical)
}

/// Maps a canonical storage name to the accessor name it is exposed under.
pub fn to_alias(name: &str) -> &str {
    RESERVED_ALIASES
        .iter()
        .find(|(canonical, _)| *canonical == name)
        .map_or(name, |(_, alias)| *alias)
}

/// Returns true if the canonical name has a distinct accessor alias.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_ALIASES
        .iter()
        .any(|(canonical, _)| *canonical == name)
}
