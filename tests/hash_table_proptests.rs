// HashTable public-API property tests.
//
// Property 1: parity with std::collections::HashMap under random
// insert/remove/get sequences, checked after every operation and again at
// the end through iteration.
//
// Property 2: cursor traversal on a quiescent table yields exactly the
// model's entries, across chain-only and collision-heavy tables.
use chained_hashmap::{HashTable, KeyAdapter};
use proptest::prelude::*;
use std::collections::HashMap;

proptest! {
    #[test]
    fn prop_matches_std_hashmap(
        ops in proptest::collection::vec((0u8..3u8, any::<u8>(), any::<i64>()), 1..200)
    ) {
        let mut table: HashTable<String, i64> = HashTable::new();
        let mut model: HashMap<String, i64> = HashMap::new();

        for (op, raw_key, value) in ops {
            let key = format!("k{raw_key}");
            match op {
                0 => {
                    prop_assert_eq!(table.insert(key.clone(), value), model.insert(key.clone(), value));
                }
                1 => {
                    prop_assert_eq!(table.remove(&key), model.remove(&key));
                }
                2 => {
                    prop_assert_eq!(table.get(&key), model.get(&key));
                }
                _ => unreachable!(),
            }
            prop_assert_eq!(table.len(), model.len());
        }

        let mut seen: Vec<(String, i64)> =
            table.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let mut expected: Vec<(String, i64)> =
            model.into_iter().collect();
        seen.sort();
        expected.sort();
        prop_assert_eq!(seen, expected);
    }
}

// Degenerate adapter: two hash values for the whole key space.
#[derive(Clone, Debug, Default)]
struct TwoBucketAdapter;

impl KeyAdapter<u8> for TwoBucketAdapter {
    fn hash(&self, key: &u8) -> u64 {
        u64::from(key % 2)
    }
    fn equals(&self, a: &u8, b: &u8) -> bool {
        a == b
    }
}

proptest! {
    #[test]
    fn prop_cursor_sees_exactly_the_model(
        keys in proptest::collection::btree_set(any::<u8>(), 1..200)
    ) {
        let mut table: HashTable<u8, u8, TwoBucketAdapter> =
            HashTable::with_adapter(TwoBucketAdapter);
        for k in &keys {
            table.insert(*k, k.wrapping_add(1));
        }

        let mut cursor = table.cursor();
        let mut seen = Vec::new();
        while let Some(item) = cursor.next(&table) {
            let (k, v) = item.expect("no structural change during traversal");
            prop_assert_eq!(*v, k.wrapping_add(1));
            seen.push(*k);
        }
        seen.sort_unstable();
        let expected: Vec<u8> = keys.into_iter().collect();
        prop_assert_eq!(seen, expected);
    }
}
