// tests/graph_editing.rs
use cheese_bot::{
    BEGIN_NODE, BlockGraph, Condition, ConditionSlot, InstructionKind, NodeId, STATEMENT_SIZE,
};
use glam::Vec2;

/// Begin → a → b → c, all MoveForward, laid out left to right.
fn setup() -> (BlockGraph, [NodeId; 3]) {
    let mut graph = BlockGraph::new();
    let a = graph.add_node(InstructionKind::MoveForward, Vec2::new(100.0, 0.0)).unwrap();
    let b = graph.add_node(InstructionKind::MoveForward, Vec2::new(200.0, 0.0)).unwrap();
    let c = graph.add_node(InstructionKind::MoveForward, Vec2::new(300.0, 0.0)).unwrap();
    assert!(graph.connect(BEGIN_NODE, a));
    assert!(graph.connect(a, b));
    assert!(graph.connect(b, c));
    (graph, [a, b, c])
}

#[test]
fn test_new_graph_has_only_begin() {
    let graph = BlockGraph::new();
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.node(BEGIN_NODE).unwrap().kind, InstructionKind::Begin);
    assert_eq!(graph.successor(BEGIN_NODE), None);
    assert_eq!(graph.chain().collect::<Vec<_>>(), vec![BEGIN_NODE]);
}

#[test]
fn test_add_node_allocates_sequential_ids() {
    let mut graph = BlockGraph::new();
    let first = graph.add_node(InstructionKind::TurnLeft, Vec2::ZERO).unwrap();
    let second = graph.add_node(InstructionKind::EatCheese, Vec2::ZERO).unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 2);

    // Ids are not reused after a removal.
    graph.remove(&[second]);
    let third = graph.add_node(InstructionKind::TurnRight, Vec2::ZERO).unwrap();
    assert_eq!(third, 3);
}

#[test]
fn test_add_node_rejects_operands_and_begin() {
    let mut graph = BlockGraph::new();
    for kind in [
        InstructionKind::Begin,
        InstructionKind::ConditionNot,
        InstructionKind::FacingWall,
        InstructionKind::FacingCheese,
        InstructionKind::Blank,
    ] {
        assert_eq!(graph.add_node(kind, Vec2::ZERO), None, "{kind:?} should be refused");
    }
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_control_nodes_start_with_blank_condition() {
    let mut graph = BlockGraph::new();
    let cond = graph.add_node(InstructionKind::While, Vec2::ZERO).unwrap();
    let plain = graph.add_node(InstructionKind::MoveForward, Vec2::ZERO).unwrap();

    assert_eq!(graph.node(cond).unwrap().condition, Some(Condition::default()));
    assert_eq!(graph.node(plain).unwrap().condition, None);
}

#[test]
fn test_connect_rejects_cycles() {
    let (mut graph, [a, _b, c]) = setup();

    // c → a would close a loop through b.
    assert!(!graph.connect(c, a));
    assert_eq!(graph.successor(c), None, "rejected link must leave the graph unchanged");

    // Nor can anything point back at Begin from inside its own chain.
    assert!(!graph.connect(c, BEGIN_NODE));

    // Self-links are cycles too.
    assert!(!graph.connect(a, a));
    assert_eq!(graph.chain().count(), 4);
}

#[test]
fn test_connect_overwrites_previous_successor() {
    let (mut graph, [a, b, c]) = setup();

    // Skip b: Begin → a → c.
    assert!(graph.connect(a, c));
    assert_eq!(graph.successor(a), Some(c));
    assert_eq!(graph.chain().collect::<Vec<_>>(), vec![BEGIN_NODE, a, c]);

    // b still points at c but is no longer on the compiled chain.
    assert_eq!(graph.successor(b), Some(c));
}

#[test]
fn test_connect_ignores_unknown_ids() {
    let (mut graph, [a, ..]) = setup();
    assert!(!graph.connect(a, 99));
    assert!(!graph.connect(99, a));
}

#[test]
fn test_random_connects_never_form_cycle() {
    let mut graph = BlockGraph::new();
    let ids: Vec<NodeId> = (0..8)
        .map(|i| {
            graph
                .add_node(InstructionKind::MoveForward, Vec2::splat(i as f32))
                .unwrap()
        })
        .collect();

    // Try every ordered pair, in an order that mixes forward and backward links.
    for &from in ids.iter().rev() {
        for &to in &ids {
            graph.connect(from, to);
        }
    }

    // Following successors from any node must terminate within len() hops.
    for (id, _) in graph.nodes() {
        let mut hops = 0;
        let mut current = Some(id);
        while let Some(node) = current {
            hops += 1;
            assert!(hops <= graph.len(), "cycle reachable from {id}");
            current = graph.successor(node);
        }
    }
}

#[test]
fn test_disconnect() {
    let (mut graph, [a, b, _c]) = setup();
    assert_eq!(graph.disconnect(a), Some(b));
    assert_eq!(graph.disconnect(a), None);
    assert_eq!(graph.chain().collect::<Vec<_>>(), vec![BEGIN_NODE, a]);
}

#[test]
fn test_remove_severs_without_splicing() {
    let (mut graph, [a, b, c]) = setup();

    assert_eq!(graph.remove(&[b]), 1);

    assert!(graph.node(b).is_none());
    // a loses its successor entirely; it does not adopt c.
    assert_eq!(graph.successor(a), None);
    assert!(graph.node(c).is_some());
    assert_eq!(graph.chain().collect::<Vec<_>>(), vec![BEGIN_NODE, a]);
}

#[test]
fn test_remove_never_deletes_begin() {
    let (mut graph, [a, ..]) = setup();
    assert_eq!(graph.remove(&[BEGIN_NODE, a, 42]), 1);
    assert!(graph.node(BEGIN_NODE).is_some());
    assert_eq!(graph.successor(BEGIN_NODE), None);
}

#[test]
fn test_reachable() {
    let (graph, [a, b, c]) = setup();
    assert!(graph.reachable(BEGIN_NODE, c));
    assert!(graph.reachable(a, b));
    assert!(graph.reachable(b, b), "a node reaches itself");
    assert!(!graph.reachable(c, a));
}

#[test]
fn test_set_condition_respects_slots() {
    let mut graph = BlockGraph::new();
    let cond = graph.add_node(InstructionKind::If, Vec2::ZERO).unwrap();
    let plain = graph.add_node(InstructionKind::TurnLeft, Vec2::ZERO).unwrap();

    assert!(graph.set_condition(cond, ConditionSlot::Negation, InstructionKind::ConditionNot));
    assert!(graph.set_condition(cond, ConditionSlot::Predicate, InstructionKind::FacingPit));

    // Wrong kind for the slot.
    assert!(!graph.set_condition(cond, ConditionSlot::Negation, InstructionKind::FacingWall));
    assert!(!graph.set_condition(cond, ConditionSlot::Predicate, InstructionKind::ConditionNot));
    assert!(!graph.set_condition(cond, ConditionSlot::Predicate, InstructionKind::MoveForward));

    // Statement blocks have no slots.
    assert!(!graph.set_condition(plain, ConditionSlot::Predicate, InstructionKind::FacingPit));

    let condition = graph.node(cond).unwrap().condition.unwrap();
    assert!(condition.is_negated());
    assert_eq!(condition.predicate, InstructionKind::FacingPit);

    // Blank clears a slot.
    assert!(graph.set_condition(cond, ConditionSlot::Negation, InstructionKind::Blank));
    assert!(!graph.node(cond).unwrap().condition.unwrap().is_negated());
}

#[test]
fn test_drop_condition_targets_block_under_point() {
    let mut graph = BlockGraph::new();
    let cond = graph.add_node(InstructionKind::While, Vec2::new(50.0, 100.0)).unwrap();

    let inside = Vec2::new(60.0, 110.0);
    assert!(graph.drop_condition(inside, InstructionKind::FacingWall));
    assert!(graph.drop_condition(inside, InstructionKind::ConditionNot));
    assert!(
        !graph.drop_condition(Vec2::new(5.0, 5.0), InstructionKind::FacingPit),
        "Begin has no slots"
    );
    assert!(!graph.drop_condition(Vec2::new(900.0, 900.0), InstructionKind::FacingPit));

    let condition = graph.node(cond).unwrap().condition.unwrap();
    assert_eq!(condition.slot(ConditionSlot::Predicate), InstructionKind::FacingWall);
    assert_eq!(condition.slot(ConditionSlot::Negation), InstructionKind::ConditionNot);
}

#[test]
fn test_canvas_hit_testing() {
    let (mut graph, [a, b, c]) = setup();

    assert_eq!(graph.node_at(Vec2::new(110.0, 10.0)), Some(a));
    // Edges are exclusive.
    assert_eq!(graph.node_at(Vec2::new(100.0, 10.0)), None);

    let picked = graph.nodes_within(Vec2::new(150.0, -10.0), Vec2::new(400.0, 40.0));
    assert_eq!(picked, vec![b, c]);

    assert!(graph.move_node(c, Vec2::new(1000.0, 1000.0)));
    let picked = graph.nodes_within(Vec2::new(400.0, 40.0), Vec2::new(150.0, -10.0));
    assert_eq!(picked, vec![b]);

    let node = graph.node(b).unwrap();
    assert_eq!(node.size(), STATEMENT_SIZE);
}
