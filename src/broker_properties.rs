//! Helpers over [`ActiveMQArtemisSpec::broker_properties`](crate::crd::ActiveMQArtemisSpec::broker_properties).
//!
//! Each entry is a single `dotted.key=value` line. Only the first `=` separates the key from the value,
//! values may contain more of them. Lines are kept in order, edits happen in place whenever possible.

/// Prefix shared by all security role lines, e.g. `securityRoles.*.admin.send=true`.
pub const SECURITY_ROLES_PREFIX: &str = "securityRoles";

pub fn format_line(key: &str, value: &str) -> String {
    format!("{key}={value}")
}

/// Splits a line into key and value. A line without `=` is all key.
pub fn parse_line(line: &str) -> (&str, &str) {
    line.split_once('=').unwrap_or((line, ""))
}

/// Value of the first line with exactly this key.
pub fn find_value<'a>(properties: &'a [String], key: &str) -> Option<&'a str> {
    properties
        .iter()
        .map(|line| parse_line(line))
        .find(|(line_key, _)| *line_key == key)
        .map(|(_, value)| value)
}

/// Rewrites the value of the first line with exactly this key, keeping its position.
/// Returns `false` when no such line exists.
pub fn replace_value(properties: &mut [String], key: &str, value: &str) -> bool {
    let Some(line) = properties
        .iter_mut()
        .find(|line| parse_line(line).0 == key)
    else {
        return false;
    };

    *line = format_line(key, value);
    true
}

/// Key/value pairs of all lines whose key starts with `prefix`, with the prefix stripped from the key.
pub fn entries_with_prefix<'a>(
    properties: &'a [String],
    prefix: &'a str,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    properties.iter().filter_map(move |line| {
        let (key, value) = parse_line(line);
        key.strip_prefix(prefix).map(|rest| (rest, value))
    })
}

pub fn remove_prefixed(properties: &mut Vec<String>, prefix: &str) {
    properties.retain(|line| !line.starts_with(prefix));
}

/// Replaces `old_prefix` with `new_prefix` on every line starting with it.
pub fn rename_prefix(properties: &mut [String], old_prefix: &str, new_prefix: &str) {
    for line in properties.iter_mut() {
        if let Some(rest) = line.strip_prefix(old_prefix) {
            *line = format!("{new_prefix}{rest}");
        }
    }
}

/// Drops every line starting with `prefix`, then appends `entries` in order.
/// The batch always ends up contiguous at the end of the list.
pub fn replace_batch<'a, I>(properties: &mut Vec<String>, prefix: &str, entries: I)
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    remove_prefixed(properties, prefix);
    properties.extend(
        entries
            .into_iter()
            .map(|(key, value)| format_line(key, value)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(lines: &[&str]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parse_keeps_extra_separators_in_value() {
        assert_eq!(parse_line("a.b=c=d"), ("a.b", "c=d"));
        assert_eq!(parse_line("flag"), ("flag", ""));
    }

    #[test]
    fn replace_value_keeps_position() {
        let mut properties = props(&["a=1", "b=2", "c=3"]);
        assert!(replace_value(&mut properties, "b", "20"));
        assert_eq!(properties, props(&["a=1", "b=20", "c=3"]));
        assert!(!replace_value(&mut properties, "d", "4"));
    }

    #[test]
    fn rename_prefix_touches_only_matching_lines() {
        let mut properties = props(&[
            "acceptorConfigurations.a0.factoryClassName=x",
            "acceptorConfigurations.a01.factoryClassName=y",
            "other=z",
        ]);
        rename_prefix(
            &mut properties,
            "acceptorConfigurations.a0.",
            "acceptorConfigurations.new.",
        );
        assert_eq!(
            properties,
            props(&[
                "acceptorConfigurations.new.factoryClassName=x",
                "acceptorConfigurations.a01.factoryClassName=y",
                "other=z",
            ])
        );
    }

    #[test]
    fn replace_batch_moves_batch_to_the_end() {
        let mut properties = props(&["securityRoles.a=1", "other=z", "securityRoles.b=2"]);
        replace_batch(
            &mut properties,
            SECURITY_ROLES_PREFIX,
            [("securityRoles.c", "3")],
        );
        assert_eq!(properties, props(&["other=z", "securityRoles.c=3"]));
    }

    #[test]
    fn entries_with_prefix_strips_prefix() {
        let properties = props(&["p.x=1", "q.y=2", "p.z=3"]);
        let entries = entries_with_prefix(&properties, "p.").collect::<Vec<_>>();
        assert_eq!(entries, vec![("x", "1"), ("z", "3")]);
    }
}
