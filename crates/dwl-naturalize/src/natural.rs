use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use dwl_types::{AttributeValue, BulkDataRef, NaturalDataset, WireAttribute, WireDataset};

use crate::dictionary::{keyword_for, tag_for, vr_for};

/// PN component groups in preference order.
const PERSON_NAME_GROUPS: [&str; 3] = ["Alphabetic", "Ideographic", "Phonetic"];

/// Convert a tag-keyed wire dataset into a keyword-keyed natural dataset.
///
/// Total over any decoded [`WireDataset`]: unknown tags keep their raw key,
/// malformed sequence items become empty items rather than errors.
pub fn naturalize(dataset: &WireDataset) -> NaturalDataset {
    dataset
        .iter()
        .map(|(tag, attribute)| {
            let key = keyword_for(tag).unwrap_or(tag.as_str()).to_string();
            (key, naturalize_attribute(attribute))
        })
        .collect()
}

/// Naturalize every dataset, keeping their order.
pub fn naturalize_all(datasets: &[WireDataset]) -> Vec<NaturalDataset> {
    datasets.iter().map(naturalize).collect()
}

fn naturalize_attribute(attribute: &WireAttribute) -> AttributeValue {
    let vr = attribute.vr.as_deref().unwrap_or("");
    match &attribute.value {
        Some(values) if !values.is_empty() => {
            if vr == "SQ" {
                return AttributeValue::Sequence(values.iter().map(naturalize_item).collect());
            }
            let mut converted: Vec<AttributeValue> = values
                .iter()
                .map(|v| if vr == "PN" { person_name(v) } else { scalar(v) })
                .collect();
            if converted.len() == 1 {
                converted.remove(0)
            } else {
                AttributeValue::List(converted)
            }
        }
        _ => {
            if let Some(uri) = &attribute.bulk_data_uri {
                AttributeValue::BulkData(BulkDataRef::unresolved(uri.clone()))
            } else if let Some(inline) = &attribute.inline_binary {
                AttributeValue::InlineBinary(inline.clone())
            } else if vr == "SQ" {
                AttributeValue::Sequence(Vec::new())
            } else {
                AttributeValue::Empty
            }
        }
    }
}

fn naturalize_item(item: &Value) -> NaturalDataset {
    WireDataset::from_json_value(item)
        .map(|ds| naturalize(&ds))
        .unwrap_or_default()
}

fn scalar(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Empty,
        Value::String(s) => AttributeValue::Text(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Integer(i),
            None => AttributeValue::Decimal(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::Bool(b) => AttributeValue::Text(b.to_string()),
        other => AttributeValue::Text(other.to_string()),
    }
}

fn person_name(value: &Value) -> AttributeValue {
    match value {
        Value::Object(groups) => PERSON_NAME_GROUPS
            .iter()
            .find_map(|g| groups.get(*g).and_then(Value::as_str))
            .map(|s| AttributeValue::Text(s.to_string()))
            .unwrap_or(AttributeValue::Empty),
        other => scalar(other),
    }
}

/// Convert a natural dataset back to the wire model.
///
/// Keywords missing from the dictionary are written under their own name,
/// mirroring the pass-through in [`naturalize`]. Resolved bulk data is
/// written inline (base64) since its URI may no longer be reachable.
pub fn denaturalize(dataset: &NaturalDataset) -> WireDataset {
    dataset
        .iter()
        .map(|(keyword, value)| {
            let tag = tag_for(keyword).unwrap_or(keyword.as_str());
            let vr = vr_for(tag).map(str::to_string);
            (tag.to_string(), denaturalize_attribute(vr, value))
        })
        .collect()
}

fn denaturalize_attribute(vr: Option<String>, value: &AttributeValue) -> WireAttribute {
    let is_pn = vr.as_deref() == Some("PN");
    let mut attribute = WireAttribute {
        vr,
        ..Default::default()
    };
    match value {
        AttributeValue::Empty => {}
        AttributeValue::BulkData(BulkDataRef::Unresolved { uri }) => {
            attribute.bulk_data_uri = Some(uri.clone());
        }
        AttributeValue::BulkData(BulkDataRef::Resolved { value, .. }) => {
            attribute.inline_binary = Some(STANDARD.encode(value));
        }
        AttributeValue::InlineBinary(data) => attribute.inline_binary = Some(data.clone()),
        AttributeValue::Sequence(items) => {
            let values = items
                .iter()
                .map(|item| serde_json::to_value(denaturalize(item)).unwrap_or(Value::Null))
                .collect();
            attribute.value = Some(values);
        }
        AttributeValue::List(items) => {
            attribute.value = Some(items.iter().map(|v| wire_scalar(v, is_pn)).collect());
        }
        single => attribute.value = Some(vec![wire_scalar(single, is_pn)]),
    }
    attribute
}

fn wire_scalar(value: &AttributeValue, is_pn: bool) -> Value {
    match value {
        AttributeValue::Text(s) if is_pn => {
            let mut groups = Map::new();
            groups.insert(PERSON_NAME_GROUPS[0].to_string(), Value::from(s.as_str()));
            Value::Object(groups)
        }
        AttributeValue::Text(s) => Value::from(s.as_str()),
        AttributeValue::Integer(i) => Value::from(*i),
        AttributeValue::Decimal(d) => serde_json::Number::from_f64(*d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwl_types::tags;
    use proptest::prelude::*;
    use serde_json::json;

    fn instance() -> WireDataset {
        WireDataset::from_json_value(&json!({
            "0020000D": { "vr": "UI", "Value": ["1.2.3"] },
            "0020000E": { "vr": "UI", "Value": ["1.2.3.4"] },
            "00080018": { "vr": "UI", "Value": ["1.2.3.4.5"] },
            "00100010": { "vr": "PN", "Value": [{ "Alphabetic": "Doe^Jane" }] },
            "00200032": { "vr": "DS", "Value": [-125.0, -130.5, 42] },
            "00280008": { "vr": "IS", "Value": [10] },
            "00281050": { "vr": "DS" },
            "7FE00010": { "vr": "OW", "BulkDataURI": "http://host/bulk/7FE00010" },
            "00191010": { "vr": "LO", "Value": ["private"] },
            "00081115": { "vr": "SQ", "Value": [
                { "0020000E": { "vr": "UI", "Value": ["9.9"] } },
                "not-an-item"
            ] }
        }))
        .unwrap()
    }

    #[test]
    fn known_tags_become_keywords() {
        let natural = naturalize(&instance());
        assert_eq!(natural.get_str("StudyInstanceUID"), Some("1.2.3"));
        assert_eq!(natural.get_str("SOPInstanceUID"), Some("1.2.3.4.5"));
        assert_eq!(natural.get_u32("NumberOfFrames"), Some(10));
        assert!(!natural.contains(tags::STUDY_INSTANCE_UID));
    }

    #[test]
    fn naturalize_all_keeps_order() {
        let first = WireDataset::new().with_string(tags::SOP_INSTANCE_UID, "UI", "1");
        let second = WireDataset::new().with_string(tags::SOP_INSTANCE_UID, "UI", "2");
        let natural = naturalize_all(&[first, second]);
        let sops: Vec<_> = natural.iter().filter_map(|d| d.get_str("SOPInstanceUID")).collect();
        assert_eq!(sops, ["1", "2"]);
        assert!(naturalize_all(&[]).is_empty());
    }

    #[test]
    fn unknown_tags_pass_through() {
        let natural = naturalize(&instance());
        assert_eq!(natural.get_str("00191010"), Some("private"));
    }

    #[test]
    fn person_name_uses_alphabetic_group() {
        let natural = naturalize(&instance());
        assert_eq!(natural.get_str("PatientName"), Some("Doe^Jane"));
    }

    #[test]
    fn multi_valued_stays_a_list() {
        let natural = naturalize(&instance());
        let position = natural.get("ImagePositionPatient").unwrap();
        assert_eq!(
            position,
            &AttributeValue::List(vec![
                AttributeValue::Decimal(-125.0),
                AttributeValue::Decimal(-130.5),
                AttributeValue::Integer(42),
            ])
        );
    }

    #[test]
    fn missing_value_is_empty() {
        let natural = naturalize(&instance());
        assert_eq!(natural.get("WindowCenter"), Some(&AttributeValue::Empty));
    }

    #[test]
    fn bulk_data_uri_without_value_is_unresolved_reference() {
        let natural = naturalize(&instance());
        let pixel = natural.get("PixelData").unwrap().bulk_data().unwrap();
        assert!(!pixel.is_resolved());
        assert_eq!(pixel.uri(), "http://host/bulk/7FE00010");
    }

    #[test]
    fn inline_value_wins_over_bulk_data_uri() {
        let ds = WireDataset::new().with_attribute(
            "00281050",
            WireAttribute {
                vr: Some("DS".into()),
                value: Some(vec![json!(40)]),
                bulk_data_uri: Some("http://ignored".into()),
                inline_binary: None,
            },
        );
        let natural = naturalize(&ds);
        assert_eq!(natural.get("WindowCenter"), Some(&AttributeValue::Integer(40)));
    }

    #[test]
    fn sequences_are_recursive_and_tolerate_bad_items() {
        let natural = naturalize(&instance());
        let items = natural.get("ReferencedSeriesSequence").unwrap().as_sequence().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get_str("SeriesInstanceUID"), Some("9.9"));
        assert!(items[1].is_empty());
    }

    #[test]
    fn denaturalize_restores_known_tags() {
        let wire = instance();
        let back = denaturalize(&naturalize(&wire));
        assert_eq!(back.string(tags::SOP_INSTANCE_UID), Some("1.2.3.4.5"));
        assert_eq!(back.get("00100010").unwrap().first(), Some(&json!({ "Alphabetic": "Doe^Jane" })));
        assert_eq!(
            back.get(tags::PIXEL_DATA).unwrap().bulk_data_uri.as_deref(),
            Some("http://host/bulk/7FE00010")
        );
        assert_eq!(naturalize(&back).get_str("00191010"), Some("private"));
    }

    #[test]
    fn denaturalize_inlines_resolved_bulk_data() {
        let mut natural = NaturalDataset::new();
        let mut reference = BulkDataRef::unresolved("http://host/bulk");
        reference.resolve(bytes::Bytes::from_static(&[0, 1, 2]));
        natural.insert("PixelData", AttributeValue::BulkData(reference));
        let wire = denaturalize(&natural);
        assert_eq!(wire.get(tags::PIXEL_DATA).unwrap().inline_binary.as_deref(), Some("AAEC"));
    }

    fn arb_attribute() -> impl Strategy<Value = WireAttribute> {
        prop_oneof![
            proptest::collection::vec("[ -~]{0,12}", 0..4).prop_map(|vals| WireAttribute::with_values(
                "LO",
                vals.into_iter().map(Value::from).collect()
            )),
            proptest::collection::vec(any::<i32>(), 1..4).prop_map(|vals| WireAttribute::with_values(
                "IS",
                vals.into_iter().map(Value::from).collect()
            )),
            "[a-z/]{1,16}".prop_map(|uri| WireAttribute::bulk_data("OB", uri)),
            Just(WireAttribute::default()),
        ]
    }

    fn arb_dataset() -> impl Strategy<Value = WireDataset> {
        proptest::collection::btree_map("[0-9A-F]{8}", arb_attribute(), 0..12)
            .prop_map(|map| map.into_iter().collect())
    }

    proptest! {
        #[test]
        fn naturalize_is_deterministic(ds in arb_dataset()) {
            prop_assert_eq!(naturalize(&ds), naturalize(&ds));
        }

        #[test]
        fn naturalize_keeps_every_attribute(ds in arb_dataset()) {
            prop_assert_eq!(naturalize(&ds).len(), ds.len());
        }
    }
}
