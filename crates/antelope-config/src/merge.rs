//! "Right wins at leaf" JSON merging used for environment overlays and
//! module side-car configuration (spec §4.1, §6).

use serde_json::Value;

/// Merge `overlay` into `base`, never replacing a whole sub-tree: only
/// overlapping leaves are overwritten by `overlay`'s value.
pub fn merge_right_wins(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge_right_wins(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_overwrites_leaf() {
        let mut base = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let overlay = json!({"b": {"c": 99}});
        merge_right_wins(&mut base, &overlay);
        assert_eq!(base, json!({"a": 1, "b": {"c": 99, "d": 3}}));
    }

    #[test]
    fn missing_keys_are_added_not_replaced() {
        let mut base = json!({"a": {"x": 1}});
        let overlay = json!({"a": {"y": 2}, "b": 5});
        merge_right_wins(&mut base, &overlay);
        assert_eq!(base, json!({"a": {"x": 1, "y": 2}, "b": 5}));
    }

    #[test]
    fn sub_tree_is_never_wholesale_replaced() {
        let mut base = json!({"a": {"x": 1, "z": 3}});
        let overlay = json!({"a": {"x": 2}});
        merge_right_wins(&mut base, &overlay);
        // `z` survives: the whole `a` object was not replaced.
        assert_eq!(base, json!({"a": {"x": 2, "z": 3}}));
    }
}
