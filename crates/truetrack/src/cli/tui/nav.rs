use super::app::TuiMode;

#[derive(Debug, Clone, Copy)]
pub struct NavItem {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub mode: TuiMode,
}

/// Top-level screens reachable by number key. Login and Journey are entered
/// from these and are not listed.
pub const NAV_ITEMS: &[NavItem] = &[
    NavItem {
        key: "0",
        label: "Home",
        description: "About TrueTrack and the single-use demo",
        mode: TuiMode::Home,
    },
    NavItem {
        key: "1",
        label: "Verify",
        description: "Scan a product and check it is genuine",
        mode: TuiMode::Customer,
    },
    NavItem {
        key: "2",
        label: "Retailer",
        description: "Scan stock into inventory",
        mode: TuiMode::Retailer,
    },
    NavItem {
        key: "3",
        label: "Admin",
        description: "QR batches, scan logs and anomalies",
        mode: TuiMode::Admin,
    },
];

pub fn nav_index_for_mode(mode: TuiMode) -> Option<usize> {
    NAV_ITEMS.iter().position(|item| item.mode == mode)
}

pub fn nav_mode_for_index(index: usize) -> TuiMode {
    NAV_ITEMS
        .get(index)
        .map(|item| item.mode)
        .unwrap_or(TuiMode::Home)
}

pub fn nav_mode_for_key(key: char) -> Option<TuiMode> {
    NAV_ITEMS
        .iter()
        .find(|item| item.key.chars().eq(std::iter::once(key)))
        .map(|item| item.mode)
}

pub fn nav_max_index() -> usize {
    NAV_ITEMS.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn nav_items_have_unique_modes_and_keys() {
        let mut mode_set = HashSet::new();
        let mut key_set = HashSet::new();
        for item in NAV_ITEMS {
            assert!(
                mode_set.insert(std::mem::discriminant(&item.mode)),
                "Duplicate mode in NAV_ITEMS: {:?}",
                item.mode
            );
            assert!(
                key_set.insert(item.key),
                "Duplicate key in NAV_ITEMS: {}",
                item.key
            );
        }
    }

    #[test]
    fn nav_index_roundtrips() {
        for (idx, item) in NAV_ITEMS.iter().enumerate() {
            assert_eq!(
                nav_index_for_mode(item.mode),
                Some(idx),
                "nav_index_for_mode mismatch for {:?}",
                item.mode
            );
            assert_eq!(
                nav_mode_for_index(idx),
                item.mode,
                "nav_mode_for_index mismatch for {}",
                idx
            );
        }
        assert_eq!(nav_max_index(), NAV_ITEMS.len().saturating_sub(1));
    }

    #[test]
    fn nav_keys_resolve_to_modes() {
        assert_eq!(nav_mode_for_key('0'), Some(TuiMode::Home));
        assert_eq!(nav_mode_for_key('3'), Some(TuiMode::Admin));
        assert_eq!(nav_mode_for_key('9'), None);
        assert_eq!(nav_index_for_mode(TuiMode::Login), None);
    }
}
