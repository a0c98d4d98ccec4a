//! Property tests for IRI helpers, iterator discovery and subclass closure

use std::collections::HashSet;

use maptomethod::mapping::discover_iterator;
use maptomethod::ontology::subclass_closure;
use maptomethod::utils::{mapping_filename, short_id};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

proptest! {
    #[test]
    fn short_id_has_no_separators(iri in "[a-z]{1,5}://[a-zA-Z0-9/#._-]{0,40}") {
        let id = short_id(&iri);
        prop_assert!(!id.contains('/'));
        prop_assert!(!id.contains('#'));
    }

    #[test]
    fn short_id_is_last_segment(
        namespace in "https://[a-z]{1,10}\\.org/([a-z]{1,6}/){0,3}",
        name in "[A-Za-z][A-Za-z0-9_]{0,15}",
        hash in any::<bool>(),
    ) {
        let sep = if hash { "#" } else { "" };
        let iri = format!("{namespace}{sep}{name}");
        prop_assert_eq!(short_id(&iri), name);
    }

    #[test]
    fn metadata_documents_keep_their_stem(stem in "[a-z]{1,10}") {
        let url = format!("https://example.org/api/files/{stem}-metadata.json");
        prop_assert_eq!(mapping_filename(&url), format!("{stem}-map.yaml"));
    }

    #[test]
    fn mapping_filename_is_a_yaml_basename(
        path in "[a-zA-Z0-9_-]{0,12}(/[a-zA-Z0-9._-]{0,12}){0,3}",
        query in proptest::option::of("[a-z]{1,5}=[a-z0-9]{1,5}"),
    ) {
        let mut url = format!("https://example.org/{path}");
        if let Some(query) = query {
            url.push('?');
            url.push_str(&query);
        }
        let name = mapping_filename(&url);
        prop_assert!(name.ends_with("-map.yaml"));
        prop_assert!(!name.contains('/'));
        prop_assert!(!name.contains('?'));
    }

    #[test]
    fn nested_array_path_is_found(keys in proptest::collection::vec("[a-z][a-z0-9_]{0,7}", 1..5)) {
        let mut doc: Value = json!([{ "label": "Specimen ID" }]);
        for key in keys.iter().rev() {
            let mut object = Map::new();
            object.insert(key.clone(), doc);
            doc = Value::Object(object);
        }

        let found = discover_iterator(&doc, "label");
        prop_assert!(!found.is_fallback());
        prop_assert_eq!(found.iterator, format!("$.{}[*]", keys.join(".")));
    }

    #[test]
    fn closure_starts_at_root_without_duplicates(
        edges in proptest::collection::vec((0u8..8, 0u8..8), 0..24),
        root in 0u8..8,
    ) {
        let names: Vec<(String, String)> = edges
            .iter()
            .map(|(child, parent)| (format!("C{child}"), format!("C{parent}")))
            .collect();
        let root = format!("C{root}");

        let closure = subclass_closure(
            names.iter().map(|(c, p)| (c.as_str(), p.as_str())),
            &root,
        );

        prop_assert_eq!(&closure[0], &root);
        let unique: HashSet<_> = closure.iter().collect();
        prop_assert_eq!(unique.len(), closure.len());
        for class in &closure[1..] {
            prop_assert!(names.iter().any(|(child, _)| child == class));
        }
    }
}
