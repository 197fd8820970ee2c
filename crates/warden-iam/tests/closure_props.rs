use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use warden_iam::{Iam, PermissionMeta, RoleAggregator, RoleDefinition, seed_roles};

/// Strategy: up to 12 nodes, arbitrary parent edges (self loops and cycles
/// included).
fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|nodes| {
        let edges = prop::collection::vec((0..nodes, 0..nodes), 0..30);
        (Just(nodes), edges)
    })
}

fn key(node: usize) -> String {
    format!("perm:{node}")
}

fn build(nodes: usize, edges: &[(usize, usize)]) -> Iam {
    let iam = Iam::new();
    for node in 0..nodes {
        iam.registry()
            .upsert(&key(node), None, None, &PermissionMeta::default())
            .expect("upsert");
    }
    for (parent, child) in edges {
        let meta = PermissionMeta {
            parents: vec![key(*parent)],
            ..PermissionMeta::default()
        };
        iam.registry().upsert(&key(*child), None, None, &meta).expect("edge");
    }
    iam
}

fn reachable(roots: &[usize], edges: &[(usize, usize)]) -> BTreeSet<String> {
    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for (parent, child) in edges {
        adjacency.entry(*parent).or_default().push(*child);
    }
    let mut seen = BTreeSet::new();
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(node) = stack.pop() {
        if seen.insert(node) {
            stack.extend(adjacency.get(&node).into_iter().flatten().copied());
        }
    }
    seen.into_iter().map(key).collect()
}

proptest! {
    /// Closure equals naive reachability and never repeats an entry.
    #[test]
    fn resolve_children_matches_reachability(
        (nodes, edges) in graph_strategy(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..4),
    ) {
        let iam = build(nodes, &edges);
        let roots: Vec<usize> = picks.iter().map(|pick| pick.index(nodes)).collect();
        let root_keys: Vec<String> = roots.iter().map(|node| key(*node)).collect();
        let ids: Vec<_> = iam.registry().find_by_keys(&root_keys).iter().map(|p| p.id).collect();

        let resolved = iam.registry().resolve_children(&ids);
        let keys: Vec<String> = resolved.iter().map(|p| p.key.clone()).collect();
        let unique: BTreeSet<String> = keys.iter().cloned().collect();
        prop_assert_eq!(keys.len(), unique.len());
        prop_assert_eq!(unique, reachable(&roots, &edges));
    }

    /// A role's aggregated set is exactly the closure of its grants.
    #[test]
    fn role_aggregation_is_closure_of_grants(
        (nodes, edges) in graph_strategy(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let iam = build(nodes, &edges);
        let roots: Vec<usize> = picks.iter().map(|pick| pick.index(nodes)).collect();
        let definition =
            RoleDefinition::new("tester").permissions(roots.iter().map(|node| key(*node)));
        seed_roles(&iam, &[definition]).expect("seed");

        let context = RoleAggregator::new(&iam)
            .permissions_for_roles(&["tester"])
            .expect("aggregate");
        let held: BTreeSet<String> = context.keys().into_iter().map(str::to_string).collect();
        prop_assert_eq!(held.len(), context.permissions().len());
        prop_assert_eq!(held, reachable(&roots, &edges));
    }
}
