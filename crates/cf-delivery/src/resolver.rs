//! Link resolution over a page's `includes` side tables

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use cf_core::{Link, LinkType};
use cf_query::query::MAX_INCLUDE;

use crate::model::{Asset, Entry, FieldValue, Fields};

/// Swaps link placeholders for the included entries and assets they point at.
///
/// Resolution is breadth-first from each root item. Every included object
/// gets the hop distance of its shortest link path from the root, which sits
/// at distance 0, and objects farther than `max_depth` are never built. A
/// link inside an object at distance `d` is replaced only when its target
/// sits at distance `d + 1`. Links back to the root, to an ancestor or to an
/// object already placed at the same or a shallower distance stay as
/// [`FieldValue::Link`], as do links whose target was not included.
///
/// Each target is built once per root and shared through an [`Arc`]
/// wherever it is linked from. Resolution never fails.
pub struct LinkResolver<'a> {
    entries: &'a HashMap<String, Entry>,
    assets: &'a HashMap<String, Asset>,
    max_depth: i64,
}

/// Hop distances from one root, plus the objects built so far
struct Layers {
    depths: HashMap<Link, i64>,
    built: HashMap<Link, FieldValue>,
}

fn collect_links<'v>(value: &'v FieldValue, out: &mut Vec<&'v Link>) {
    match value {
        FieldValue::Link(link) => out.push(link),
        FieldValue::Array(items) => items.iter().for_each(|item| collect_links(item, out)),
        FieldValue::Object(map) => map.values().for_each(|v| collect_links(v, out)),
        _ => {}
    }
}

impl<'a> LinkResolver<'a> {
    pub fn new(
        entries: &'a HashMap<String, Entry>,
        assets: &'a HashMap<String, Asset>,
        include_depth: i64,
    ) -> Self {
        Self {
            entries,
            assets,
            max_depth: include_depth.clamp(0, MAX_INCLUDE),
        }
    }

    pub fn max_depth(&self) -> i64 {
        self.max_depth
    }

    pub fn resolve_entry(&self, entry: &Entry) -> Entry {
        Entry {
            sys: entry.sys.clone(),
            fields: self.resolve_root(Link::entry(entry.sys.id.clone()), &entry.fields),
        }
    }

    pub fn resolve_asset(&self, asset: &Asset) -> Asset {
        Asset {
            sys: asset.sys.clone(),
            fields: self.resolve_root(Link::asset(asset.sys.id.clone()), &asset.fields),
        }
    }

    fn target_fields(&self, link: &Link) -> Option<&'a Fields> {
        match link.link_type {
            LinkType::Entry => self.entries.get(&link.id).map(|e| &e.fields),
            LinkType::Asset => self.assets.get(&link.id).map(|a| &a.fields),
        }
    }

    fn resolve_root(&self, root: Link, fields: &Fields) -> Fields {
        let (levels, mut layers) = self.layer(root, fields);

        // Deepest level first, so every object's children already exist.
        for (depth, level) in levels.iter().enumerate().rev() {
            let depth = depth as i64 + 1;
            for link in level {
                if let Some(value) = self.build(link, depth, &layers) {
                    layers.built.insert(link.clone(), value);
                }
            }
        }

        self.resolve_fields(fields, 0, &layers)
    }

    /// Breadth-first pass assigning each reachable target its hop distance.
    /// `levels[i]` holds the targets first reached at distance `i + 1`.
    fn layer(&self, root: Link, fields: &Fields) -> (Vec<Vec<Link>>, Layers) {
        let mut depths = HashMap::from([(root, 0)]);
        let mut levels = Vec::new();
        let mut frontier = vec![fields];

        for depth in 1..=self.max_depth {
            let mut links = Vec::new();
            for fields in frontier {
                fields.values().for_each(|v| collect_links(v, &mut links));
            }

            let mut level = Vec::new();
            let mut next = Vec::new();
            for link in links {
                if depths.contains_key(link) {
                    continue;
                }
                if let Some(target) = self.target_fields(link) {
                    depths.insert(link.clone(), depth);
                    level.push(link.clone());
                    next.push(target);
                }
            }
            if level.is_empty() {
                break;
            }
            levels.push(level);
            frontier = next;
        }

        let layers = Layers {
            depths,
            built: HashMap::new(),
        };
        (levels, layers)
    }

    fn build(&self, link: &Link, depth: i64, layers: &Layers) -> Option<FieldValue> {
        match link.link_type {
            LinkType::Entry => self.entries.get(&link.id).map(|target| {
                FieldValue::Entry(Arc::new(Entry {
                    sys: target.sys.clone(),
                    fields: self.resolve_fields(&target.fields, depth, layers),
                }))
            }),
            LinkType::Asset => self.assets.get(&link.id).map(|target| {
                FieldValue::Asset(Arc::new(Asset {
                    sys: target.sys.clone(),
                    fields: self.resolve_fields(&target.fields, depth, layers),
                }))
            }),
        }
    }

    fn resolve_fields(&self, fields: &Fields, depth: i64, layers: &Layers) -> Fields {
        fields
            .iter()
            .map(|(name, value)| (name.clone(), self.resolve(value, depth, layers)))
            .collect()
    }

    fn resolve(&self, value: &FieldValue, depth: i64, layers: &Layers) -> FieldValue {
        match value {
            FieldValue::Link(link) => self.follow(link, depth + 1, layers),
            FieldValue::Array(items) => FieldValue::Array(
                items.iter().map(|item| self.resolve(item, depth, layers)).collect(),
            ),
            FieldValue::Object(map) => FieldValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve(v, depth, layers)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn follow(&self, link: &Link, depth: i64, layers: &Layers) -> FieldValue {
        if depth > self.max_depth {
            return FieldValue::Link(link.clone());
        }
        match layers.depths.get(link) {
            Some(&placed) if placed == depth => {
                if let Some(value) = layers.built.get(link) {
                    return value.clone();
                }
            }
            Some(&placed) => {
                debug!(
                    link_type = %link.link_type,
                    id = %link.id,
                    placed,
                    "Link target sits nearer the root, leaving unresolved"
                );
            }
            None => {
                debug!(link_type = %link.link_type, id = %link.id, "Link target not included");
            }
        }
        FieldValue::Link(link.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn link(kind: &str, id: &str) -> Value {
        json!({"sys": {"type": "Link", "linkType": kind, "id": id}})
    }

    fn entry(id: &str, fields: Value) -> Entry {
        Entry::from_json(&json!({"sys": {"id": id, "type": "Entry"}, "fields": fields})).unwrap()
    }

    fn doge() -> Asset {
        Asset::from_json(&json!({
            "sys": {"id": "doge", "type": "Asset"},
            "fields": {"title": "Doge", "file": {"url": "//images.example/doge.jpg"}}
        }))
        .unwrap()
    }

    fn tables(entries: Vec<Entry>, assets: Vec<Asset>) -> (HashMap<String, Entry>, HashMap<String, Asset>) {
        (
            entries.into_iter().map(|e| (e.sys.id.clone(), e)).collect(),
            assets.into_iter().map(|a| (a.sys.id.clone(), a)).collect(),
        )
    }

    #[test]
    fn test_asset_link_follows_include_depth() {
        let root = entry("nyancat", json!({"image": link("Asset", "doge")}));
        let (entries, assets) = tables(vec![], vec![doge()]);

        let resolved = LinkResolver::new(&entries, &assets, 1).resolve_entry(&root);
        assert_eq!(resolved.asset_field("image").and_then(|a| a.title()), Some("Doge"));

        let unresolved = LinkResolver::new(&entries, &assets, 0).resolve_entry(&root);
        assert_eq!(
            unresolved.field("image").and_then(FieldValue::as_link),
            Some(&Link::asset("doge"))
        );
    }

    #[test]
    fn test_mutual_links_terminate() {
        let a = entry("a", json!({"name": "A", "friend": link("Entry", "b")}));
        let b = entry("b", json!({"name": "B", "friend": link("Entry", "a")}));
        let (entries, assets) = tables(vec![a.clone(), b], vec![]);

        for depth in [2, 5, MAX_INCLUDE] {
            let resolved = LinkResolver::new(&entries, &assets, depth).resolve_entry(&a);
            let friend = resolved.entry_field("friend").unwrap();
            assert_eq!(friend.str_field("name"), Some("B"));
            assert_eq!(
                friend.field("friend").and_then(FieldValue::as_link),
                Some(&Link::entry("a"))
            );
        }
    }

    #[test]
    fn test_self_link_stays_unresolved() {
        let narcissus = entry("narcissus", json!({"mirror": link("Entry", "narcissus")}));
        let (entries, assets) = tables(vec![narcissus.clone()], vec![]);

        let resolved = LinkResolver::new(&entries, &assets, 3).resolve_entry(&narcissus);
        assert!(resolved.field("mirror").unwrap().is_link());
    }

    #[test]
    fn test_missing_target_stays_unresolved() {
        let root = entry("nyancat", json!({"bestFriend": link("Entry", "garfield")}));
        let (entries, assets) = tables(vec![], vec![]);

        let resolved = LinkResolver::new(&entries, &assets, 10).resolve_entry(&root);
        assert_eq!(
            resolved.field("bestFriend").and_then(FieldValue::as_link),
            Some(&Link::entry("garfield"))
        );
    }

    #[test]
    fn test_depth_limits_chain() {
        let a = entry("a", json!({"next": link("Entry", "b")}));
        let b = entry("b", json!({"next": link("Entry", "c")}));
        let c = entry("c", json!({"next": link("Asset", "doge")}));
        let (entries, assets) = tables(vec![a.clone(), b, c], vec![doge()]);

        let resolved = LinkResolver::new(&entries, &assets, 2).resolve_entry(&a);
        let b = resolved.entry_field("next").unwrap();
        let c = b.entry_field("next").unwrap();
        assert_eq!(c.field("next").and_then(FieldValue::as_link), Some(&Link::asset("doge")));

        let resolved = LinkResolver::new(&entries, &assets, 3).resolve_entry(&a);
        let doge = resolved
            .entry_field("next")
            .and_then(|b| b.entry_field("next"))
            .and_then(|c| c.asset_field("next"));
        assert_eq!(doge.and_then(|d| d.title()), Some("Doge"));
    }

    #[test]
    fn test_links_in_arrays_and_locale_maps() {
        let root = entry(
            "nyancat",
            json!({
                "friends": [link("Entry", "happycat"), link("Entry", "garfield")],
                "image": {"en-US": link("Asset", "doge")}
            }),
        );
        let happycat = entry("happycat", json!({"name": "Happy Cat"}));
        let (entries, assets) = tables(vec![happycat], vec![doge()]);

        let resolved = LinkResolver::new(&entries, &assets, 1).resolve_entry(&root);
        let friends = resolved.field("friends").and_then(FieldValue::as_array).unwrap();
        assert_eq!(friends[0].as_entry().and_then(|e| e.str_field("name")), Some("Happy Cat"));
        assert!(friends[1].is_link());

        let image = resolved.localized("image", "en-US").and_then(FieldValue::as_asset);
        assert_eq!(image.map(|a| a.id()), Some("doge"));
    }

    #[test]
    fn test_shared_target_resolves_in_each_branch() {
        let root = entry(
            "nyancat",
            json!({"left": link("Asset", "doge"), "right": link("Asset", "doge")}),
        );
        let (entries, assets) = tables(vec![], vec![doge()]);

        let resolved = LinkResolver::new(&entries, &assets, 1).resolve_entry(&root);
        assert!(resolved.asset_field("left").is_some());
        assert!(resolved.asset_field("right").is_some());
    }

    #[test]
    fn test_shared_target_is_built_once() {
        let root = entry(
            "nyancat",
            json!({"left": link("Entry", "b"), "right": link("Entry", "c")}),
        );
        let b = entry("b", json!({"pet": link("Asset", "doge")}));
        let c = entry("c", json!({"pet": link("Asset", "doge")}));
        let (entries, assets) = tables(vec![b, c], vec![doge()]);

        let resolved = LinkResolver::new(&entries, &assets, 2).resolve_entry(&root);
        let pet = |side: &str| match resolved.field(side) {
            Some(FieldValue::Entry(e)) => match e.field("pet") {
                Some(FieldValue::Asset(a)) => Arc::clone(a),
                other => panic!("pet not resolved: {:?}", other),
            },
            other => panic!("{} not resolved: {:?}", side, other),
        };
        assert!(Arc::ptr_eq(&pet("left"), &pet("right")));
    }

    fn count_resolved(value: &FieldValue) -> usize {
        match value {
            FieldValue::Entry(e) => 1 + e.fields.values().map(count_resolved).sum::<usize>(),
            FieldValue::Asset(a) => 1 + a.fields.values().map(count_resolved).sum::<usize>(),
            FieldValue::Array(items) => items.iter().map(count_resolved).sum(),
            FieldValue::Object(map) => map.values().map(count_resolved).sum(),
            _ => 0,
        }
    }

    #[test]
    fn test_densely_linked_entries_resolve_each_target_once() {
        let ids: Vec<String> = (0..12).map(|i| format!("e{}", i)).collect();
        let related = |own: &str| -> Value {
            ids.iter()
                .filter(|id| id.as_str() != own)
                .map(|id| link("Entry", id))
                .collect()
        };
        let all: Vec<Entry> = ids
            .iter()
            .map(|id| entry(id, json!({"name": id, "related": related(id.as_str())})))
            .collect();
        let root = all[0].clone();
        let (entries, assets) = tables(all, vec![]);

        let resolved = LinkResolver::new(&entries, &assets, MAX_INCLUDE).resolve_entry(&root);
        let related = resolved.field("related").and_then(FieldValue::as_array).unwrap();
        assert_eq!(related.len(), 11);
        for item in related {
            let neighbour = item.as_entry().unwrap();
            let back = neighbour.field("related").and_then(FieldValue::as_array).unwrap();
            assert!(back.iter().all(FieldValue::is_link));
        }
        let total: usize = resolved.fields.values().map(count_resolved).sum();
        assert_eq!(total, 11);
    }

    #[test]
    fn test_chain_with_back_links_resolves_forward_only() {
        let a = entry("a", json!({"next": link("Entry", "b")}));
        let b = entry("b", json!({"next": link("Entry", "c"), "back": [link("Entry", "a")]}));
        let c = entry(
            "c",
            json!({"next": link("Entry", "d"), "back": [link("Entry", "a"), link("Entry", "b")]}),
        );
        let d = entry(
            "d",
            json!({"back": [link("Entry", "a"), link("Entry", "b"), link("Entry", "c")]}),
        );
        let (entries, assets) = tables(vec![a.clone(), b, c, d], vec![]);

        let resolved = LinkResolver::new(&entries, &assets, MAX_INCLUDE).resolve_entry(&a);
        let d = resolved
            .entry_field("next")
            .and_then(|b| b.entry_field("next"))
            .and_then(|c| c.entry_field("next"))
            .unwrap();
        assert_eq!(d.id(), "d");
        let back = d.field("back").and_then(FieldValue::as_array).unwrap();
        assert!(back.iter().all(FieldValue::is_link));
    }

    #[test]
    fn test_link_to_shallower_object_stays_unresolved() {
        let root = entry(
            "nyancat",
            json!({"bestFriend": link("Entry", "happycat"), "rival": link("Entry", "garfield")}),
        );
        let happycat = entry("happycat", json!({"rival": link("Entry", "garfield")}));
        let garfield = entry("garfield", json!({"name": "Garfield"}));
        let (entries, assets) = tables(vec![happycat, garfield], vec![]);

        let resolved = LinkResolver::new(&entries, &assets, 3).resolve_entry(&root);
        assert_eq!(resolved.entry_field("rival").and_then(|g| g.str_field("name")), Some("Garfield"));
        let friend = resolved.entry_field("bestFriend").unwrap();
        assert_eq!(
            friend.field("rival").and_then(FieldValue::as_link),
            Some(&Link::entry("garfield"))
        );
    }

    #[test]
    fn test_depth_is_clamped() {
        let (entries, assets) = tables(vec![], vec![]);
        assert_eq!(LinkResolver::new(&entries, &assets, 99).max_depth(), MAX_INCLUDE);
        assert_eq!(LinkResolver::new(&entries, &assets, -1).max_depth(), 0);
    }
}
