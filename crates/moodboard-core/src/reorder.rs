//! Drag-to-reorder helpers for id-keyed lists.

use uuid::Uuid;

/// Anything that carries a stable id.
pub trait HasId {
    fn id(&self) -> Uuid;
}

/// Move the element with id `src` so that it lands before `dest`.
///
/// When the source sits before the destination, removing it shifts the
/// destination left by one, so the element ends up at `dest_index - 1`.
/// Returns `false` when either id is absent or both are equal.
pub fn move_before<T: HasId>(list: &mut Vec<T>, src: Uuid, dest: Uuid) -> bool {
    if src == dest {
        return false;
    }
    let Some(src_index) = list.iter().position(|item| item.id() == src) else {
        return false;
    };
    let Some(dest_index) = list.iter().position(|item| item.id() == dest) else {
        return false;
    };

    let item = list.remove(src_index);
    let index = if src_index < dest_index {
        dest_index - 1
    } else {
        dest_index
    };
    list.insert(index, item);
    true
}

/// Stable sort by position in `order`. Ids not in `order` go last.
pub fn sort_by_order<T: HasId>(list: &mut [T], order: &[Uuid]) {
    list.sort_by_key(|item| {
        order
            .iter()
            .position(|id| *id == item.id())
            .unwrap_or(usize::MAX)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Entry(Uuid);

    impl HasId for Entry {
        fn id(&self) -> Uuid {
            self.0
        }
    }

    fn entries(n: usize) -> Vec<Entry> {
        (0..n).map(|_| Entry(Uuid::new_v4())).collect()
    }

    fn ids(list: &[Entry]) -> Vec<Uuid> {
        list.iter().map(|e| e.0).collect()
    }

    #[test]
    fn test_move_forward_lands_before_dest() {
        let original = entries(4);
        let [a, b, c, d] = [original[0].0, original[1].0, original[2].0, original[3].0];
        let mut list = original.clone();

        assert!(move_before(&mut list, a, c));
        assert_eq!(ids(&list), vec![b, a, c, d]);
    }

    #[test]
    fn test_move_backward() {
        let original = entries(4);
        let [a, b, c, d] = [original[0].0, original[1].0, original[2].0, original[3].0];
        let mut list = original.clone();

        assert!(move_before(&mut list, d, b));
        assert_eq!(ids(&list), vec![a, d, b, c]);
    }

    #[test]
    fn test_move_to_adjacent_next_is_noop_order() {
        let original = entries(3);
        let mut list = original.clone();
        assert!(move_before(&mut list, original[0].0, original[1].0));
        assert_eq!(list, original);
    }

    #[test]
    fn test_invalid_moves() {
        let original = entries(3);
        let mut list = original.clone();
        assert!(!move_before(&mut list, original[0].0, original[0].0));
        assert!(!move_before(&mut list, Uuid::new_v4(), original[0].0));
        assert!(!move_before(&mut list, original[0].0, Uuid::new_v4()));
        assert_eq!(list, original);
    }

    #[test]
    fn test_sort_by_order() {
        let original = entries(4);
        let order = ids(&original);
        let stray = Entry(Uuid::new_v4());

        let mut list = vec![original[3], stray, original[1], original[0], original[2]];
        sort_by_order(&mut list, &order);

        let mut expected = order.clone();
        expected.push(stray.0);
        assert_eq!(ids(&list), expected);
    }
}
