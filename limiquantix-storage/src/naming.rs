//! Volume name selection.
//!
//! The check against existing names and the later create are two separate
//! calls into the pool API. Two callers creating disks with the same label
//! at the same time can both pick the same name; the second create then fails
//! in the library. The pool API has no create-if-absent primitive to close
//! that window.

/// Pick a name for a new volume that is not in `existing`.
///
/// Returns `desired` if it is free. Otherwise returns `desired.N` where `N` is
/// one more than the largest numeric suffix already used after `desired.`;
/// suffixes that do not parse count as 0. If that largest suffix is
/// `u64::MAX`, the smallest free `N >= 1` is used instead.
pub fn choose_name<S: AsRef<str>>(desired: &str, existing: &[S]) -> String {
    if !existing.iter().any(|name| name.as_ref() == desired) {
        return desired.to_string();
    }

    let prefix = format!("{}.", desired);
    let max_suffix = existing
        .iter()
        .filter_map(|name| name.as_ref().strip_prefix(prefix.as_str()))
        .map(|rest| rest.parse::<u64>().unwrap_or(0))
        .max()
        .unwrap_or(0);

    let suffix = max_suffix.checked_add(1).unwrap_or_else(|| {
        (1..=u64::MAX)
            .find(|n| {
                let candidate = format!("{}{}", prefix, n);
                !existing.iter().any(|name| name.as_ref() == candidate)
            })
            .unwrap_or(0)
    });

    format!("{}{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_name_unchanged() {
        let existing = ["other.img", "disk1.img.1"];
        assert_eq!(choose_name("disk1.img", &existing), "disk1.img");

        let none: [&str; 0] = [];
        assert_eq!(choose_name("disk1.img", &none), "disk1.img");
    }

    #[test]
    fn test_first_collision() {
        let existing = ["disk1.img"];
        assert_eq!(choose_name("disk1.img", &existing), "disk1.img.1");
    }

    #[test]
    fn test_uses_max_suffix_not_count() {
        let existing = ["L", "L.1", "L.3"];
        assert_eq!(choose_name("L", &existing), "L.4");
    }

    #[test]
    fn test_non_numeric_suffix_counts_as_zero() {
        let existing = ["L", "L.x"];
        assert_eq!(choose_name("L", &existing), "L.1");

        let existing = ["L", "L.", "L.2"];
        assert_eq!(choose_name("L", &existing), "L.3");
    }

    #[test]
    fn test_max_suffix_falls_back_to_smallest_free() {
        let existing = ["d.img", "d.img.18446744073709551615"];
        assert_eq!(choose_name("d.img", &existing), "d.img.1");

        let existing = ["d.img", "d.img.0", "d.img.1", "d.img.2", "d.img.18446744073709551615"];
        assert_eq!(choose_name("d.img", &existing), "d.img.3");
    }

    #[test]
    fn test_result_is_never_existing() {
        let existing: Vec<String> = vec![
            "vm.img".into(),
            "vm.img.1".into(),
            "vm.img.2".into(),
            "vm.img.backup".into(),
        ];
        let chosen = choose_name("vm.img", &existing);
        assert_eq!(chosen, "vm.img.3");
        assert!(!existing.contains(&chosen));
    }
}
