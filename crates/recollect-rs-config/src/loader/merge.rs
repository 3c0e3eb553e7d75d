//! Deep merge of layer values.

use serde_json::Value;

/// Overlay `layer` onto `base`. Objects merge key by key; any other value,
/// arrays included, replaces what was there.
pub(super) fn merge_json_values(base: &mut Value, layer: &Value) {
    if let (Some(base_map), Some(layer_map)) = (base.as_object_mut(), layer.as_object()) {
        for (key, value) in layer_map {
            let slot = base_map.entry(key.clone()).or_insert(Value::Null);
            merge_json_values(slot, value);
        }
        return;
    }
    *base = layer.clone();
}

#[cfg(test)]
mod tests {
    use super::merge_json_values;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_scalars_replace() {
        let mut base = json!({ "model": { "name": "a", "base_url": "x" }, "history": { "max_messages": 2 } });
        merge_json_values(&mut base, &json!({ "model": { "name": "b" }, "history": { "max_messages": 0 } }));
        assert_eq!(
            base,
            json!({ "model": { "name": "b", "base_url": "x" }, "history": { "max_messages": 0 } })
        );
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let mut base = json!({ "memory": { "args": ["a", "b"] } });
        merge_json_values(&mut base, &json!({ "memory": { "args": ["c"] } }));
        assert_eq!(base, json!({ "memory": { "args": ["c"] } }));
    }
}
