mod common;

use common::{attached_coordinator, entry, frame, leaf};
use rdb_client::{
    DebugError, FetchCompletion, FetchRequest, MergeOutcome, NameFilter, NamespaceInspector,
    Selection, TreeKind, TreeRow, VariableTree, LOADING_TEXT, TIMEOUT_TEXT,
};
use rdb_common::{ExpressionRequest, FilterLevel, NamespaceNode, StackFrame};

/// `y` as listed by its parent: three children, none of them sent yet.
fn unexpanded_list(name: &str, expr: &str, len: usize) -> NamespaceNode {
    NamespaceNode {
        name: name.to_string(),
        expr: expr.to_string(),
        type_name: "list".to_string(),
        repr: "[1, 2, 3]".to_string(),
        is_valid: true,
        child_count: len,
        ..Default::default()
    }
}

fn expanded_y() -> NamespaceNode {
    entry(
        "y",
        "y",
        "list",
        vec![leaf("0", "y[0]", "1"), leaf("1", "y[1]", "2"), leaf("2", "y[2]", "3")],
    )
}

fn locals_snapshot() -> Vec<NamespaceNode> {
    vec![entry(
        "",
        "locals()",
        "dict",
        vec![leaf("x", "x", "7"), unexpanded_list("y", "y", 3)],
    )]
}

/// `(depth, label or placeholder text)` of every visible row.
fn rows(tree: &VariableTree) -> Vec<(usize, String)> {
    tree.visible_rows()
        .into_iter()
        .map(|row| match row {
            TreeRow::Node { depth, node } => (depth, node.label.clone()),
            TreeRow::Placeholder { depth, text, .. } => (depth, text.to_string()),
        })
        .collect()
}

fn completion(request: &FetchRequest, result: Result<Vec<NamespaceNode>, DebugError>) -> FetchCompletion {
    FetchCompletion { target: request.target.clone(), result }
}

fn main_frame() -> StackFrame {
    frame("/srv/app.py", 10, "main")
}

#[test]
fn test_expand_list_shows_loading_then_leaves() {
    rdb_common::logging::ensure_test_logging(None);
    let mut tree = VariableTree::new("locals()");
    tree.populate(&locals_snapshot());
    assert_eq!(rows(&tree), vec![(0, "x".to_string()), (0, "y".to_string())]);

    let request = tree.expand("y").unwrap();
    assert_eq!(request, ExpressionRequest::expanded("y"));
    assert_eq!(
        rows(&tree),
        vec![(0, "x".to_string()), (0, "y".to_string()), (1, LOADING_TEXT.to_string())]
    );

    let outcome = tree.refresh("y", &[expanded_y()]).unwrap();

    assert_eq!(outcome, MergeOutcome::Merged { shown: 3, filtered: 0 });
    assert_eq!(
        rows(&tree),
        vec![
            (0, "x".to_string()),
            (0, "y".to_string()),
            (1, "0".to_string()),
            (1, "1".to_string()),
            (1, "2".to_string()),
        ]
    );
    let y = tree.find_node_by_expr("y").unwrap();
    assert!(y.real_children().iter().all(|child| !child.has_children));
    assert_eq!(tree.find_node_by_expr("y[1]").unwrap().display_value, "2");
}

#[test]
fn test_expand_is_idempotent() {
    rdb_common::logging::ensure_test_logging(None);
    let mut tree = VariableTree::new("locals()");
    tree.populate(&locals_snapshot());

    assert!(tree.expand("y").is_some());
    assert!(tree.expand("y").is_none());
    tree.refresh("y", &[expanded_y()]).unwrap();

    // Children stay loaded across collapse
    assert!(tree.collapse("y"));
    assert!(tree.find_node_by_expr("y[0]").is_none());
    assert!(tree.expand("y").is_none());
    assert!(tree.find_node_by_expr("y[0]").is_some());

    // Leaves and unknown expressions have nothing to fetch
    assert!(tree.expand("x").is_none());
    assert!(tree.expand("z").is_none());
}

#[test]
fn test_late_result_for_collapsed_parent_is_dropped() {
    rdb_common::logging::ensure_test_logging(None);
    let obj = entry("obj", "obj", "Point", vec![unexpanded_list("field", "obj.field", 2)]);
    let snapshot = vec![entry("", "locals()", "dict", vec![unexpanded_list("obj", "obj", 1)]), obj];
    let mut tree = VariableTree::new("locals()");
    tree.populate(&snapshot);
    assert!(tree.expand("obj.field").is_some());

    tree.collapse("obj");

    assert!(tree.find_node_by_expr("obj.field").is_none());
    let late = entry("field", "obj.field", "list", vec![leaf("0", "obj.field[0]", "1")]);
    let err = tree.merge_children("obj.field", &[late]).unwrap_err();
    assert!(matches!(err, DebugError::StaleResponse { ref expr } if expr == "obj.field"));
    assert_eq!(rows(&tree), vec![(0, "obj".to_string())]);
}

#[test]
fn test_name_filter_hides_children() {
    rdb_common::logging::ensure_test_logging(None);
    let filter = NameFilter::new("[^_]").unwrap();
    let mut tree = VariableTree::new("globals()").with_filter(filter, FilterLevel::Medium);
    let snapshot = vec![entry(
        "",
        "globals()",
        "dict",
        vec![leaf("__name__", "__name__", "'app'"), leaf("count", "count", "3")],
    )];

    let outcome = tree.populate(&snapshot);

    assert_eq!(outcome, MergeOutcome::Merged { shown: 1, filtered: 1 });
    assert_eq!(rows(&tree), vec![(0, "count".to_string())]);
    assert_eq!(tree.filter_level(), FilterLevel::Medium);

    tree.set_filter(NameFilter::default());
    tree.populate(&snapshot);
    assert_eq!(rows(&tree).len(), 2);

    assert!(matches!(NameFilter::new("(unclosed"), Err(DebugError::InvalidFilter(_))));
}

#[test]
fn test_expression_list_restores_expansion() {
    rdb_common::logging::ensure_test_logging(None);
    let mut tree = VariableTree::new("locals()");
    assert_eq!(tree.expression_list(), None);

    tree.populate(&locals_snapshot());
    tree.expand("y");
    tree.refresh("y", &[expanded_y()]).unwrap();

    let list = tree.expression_list().unwrap();
    assert_eq!(list, vec![ExpressionRequest::expanded("locals()"), ExpressionRequest::expanded("y")]);

    // Answering the list rebuilds the same rows in a fresh tree
    let mut restored = VariableTree::new("locals()");
    let mut snapshot = locals_snapshot();
    snapshot.push(expanded_y());
    restored.populate(&snapshot);
    assert_eq!(rows(&restored), rows(&tree));
    assert_eq!(restored.expression_list(), Some(list));
}

#[test]
fn test_populate_keeps_visible_selection_only() {
    rdb_common::logging::ensure_test_logging(None);
    let mut tree = VariableTree::new("locals()");
    let mut snapshot = locals_snapshot();
    snapshot.push(expanded_y());
    tree.populate(&snapshot);

    assert!(tree.select("y[2]"));
    tree.populate(&snapshot);
    assert_eq!(tree.selection(), Some(&Selection::Node("y[2]".to_string())));

    tree.populate(&locals_snapshot());
    assert_eq!(tree.selection(), None);
    assert!(!tree.select("y[2]"));
}

#[test]
fn test_refresh_keeps_first_row_selected() {
    rdb_common::logging::ensure_test_logging(None);
    let mut tree = VariableTree::new("locals()");
    tree.populate(&locals_snapshot());
    tree.expand("y");
    tree.refresh("y", &[expanded_y()]).unwrap();
    assert!(tree.select("y[0]"));

    let shorter = entry("y", "y", "list", vec![leaf("0", "y[0]", "10")]);
    tree.refresh("y", &[shorter]).unwrap();

    assert_eq!(tree.selection(), Some(&Selection::Node("y[0]".to_string())));
    assert_eq!(tree.find_node_by_expr("y[0]").unwrap().display_value, "10");
}

#[test]
fn test_inspector_first_refresh_populates_roots() {
    rdb_common::logging::ensure_test_logging(None);
    let mut inspector = NamespaceInspector::new();
    let requests = inspector.begin_refresh(Some(&main_frame()));
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.target.node.is_none()));

    let locals = requests.iter().find(|r| r.target.tree == TreeKind::Locals).unwrap();
    assert_eq!(locals.requests, vec![ExpressionRequest::expanded("locals()")]);

    let outcome = inspector.apply(completion(locals, Ok(locals_snapshot()))).unwrap();
    assert_eq!(outcome, MergeOutcome::Merged { shown: 2, filtered: 0 });
    assert_eq!(rows(inspector.tree(TreeKind::Locals)).len(), 2);
    assert_eq!(inspector.tree(TreeKind::Locals).key(), Some("main"));
}

#[test]
fn test_inspector_drops_outdated_generation() {
    rdb_common::logging::ensure_test_logging(None);
    let mut inspector = NamespaceInspector::new();
    let first = inspector.begin_refresh(Some(&main_frame()));
    let second = inspector.begin_refresh(Some(&main_frame()));

    let stale = first.iter().find(|r| r.target.tree == TreeKind::Locals).unwrap();
    let err = inspector.apply(completion(stale, Ok(locals_snapshot()))).unwrap_err();
    assert!(matches!(err, DebugError::StaleResponse { .. }));
    assert!(inspector.tree(TreeKind::Locals).is_empty());

    let fresh = second.iter().find(|r| r.target.tree == TreeKind::Locals).unwrap();
    assert!(inspector.apply(completion(fresh, Ok(locals_snapshot()))).is_ok());

    // A node fetch issued before a reload is stale as well
    let expand = inspector.expand(TreeKind::Locals, "y").unwrap();
    inspector.begin_refresh(Some(&main_frame()));
    let err = inspector.apply(completion(&expand, Ok(vec![expanded_y()]))).unwrap_err();
    assert!(matches!(err, DebugError::StaleResponse { ref expr } if expr == "y"));
}

#[test]
fn test_inspector_empty_node_answer_shows_timeout() {
    rdb_common::logging::ensure_test_logging(None);
    let mut inspector = NamespaceInspector::new();
    let requests = inspector.begin_refresh(Some(&main_frame()));
    inspector.apply(completion(&requests[0], Ok(locals_snapshot()))).unwrap();

    let expand = inspector.expand(TreeKind::Locals, "y").unwrap();
    let outcome = inspector.apply(completion(&expand, Ok(Vec::new()))).unwrap();

    assert_eq!(outcome, MergeOutcome::TimedOut);
    let tree = inspector.tree(TreeKind::Locals);
    assert_eq!(rows(tree).last(), Some(&(1, TIMEOUT_TEXT.to_string())));
    assert!(tree.find_node_by_expr("y").unwrap().real_children().is_empty());

    // Expanding again retries
    assert!(inspector.expand(TreeKind::Locals, "y").is_some());
}

#[test]
fn test_inspector_subtree_error_is_local() {
    rdb_common::logging::ensure_test_logging(None);
    let mut inspector = NamespaceInspector::new();
    let requests = inspector.begin_refresh(Some(&main_frame()));
    inspector.apply(completion(&requests[0], Ok(locals_snapshot()))).unwrap();

    let expand = inspector.expand(TreeKind::Locals, "y").unwrap();
    let broken = NamespaceNode {
        expr: "y".to_string(),
        error: Some("RuntimeError: boom".to_string()),
        ..Default::default()
    };
    let err = inspector.apply(completion(&expand, Ok(vec![broken]))).unwrap_err();

    assert!(matches!(err, DebugError::SubtreeFailed { ref expr, .. } if expr == "y"));
    let tree = inspector.tree(TreeKind::Locals);
    assert_eq!(
        rows(tree),
        vec![(0, "x".to_string()), (0, "y".to_string()), (1, "RuntimeError: boom".to_string())]
    );
}

#[test]
fn test_inspector_failed_reload_cancels_loading() {
    rdb_common::logging::ensure_test_logging(None);
    let mut inspector = NamespaceInspector::new();
    let requests = inspector.begin_refresh(Some(&main_frame()));
    inspector.apply(completion(&requests[0], Ok(locals_snapshot()))).unwrap();
    inspector.expand(TreeKind::Locals, "y").unwrap();

    let reload = inspector.begin_refresh(Some(&main_frame()));
    let outcome = inspector.apply(completion(&reload[0], Ok(Vec::new()))).unwrap();

    assert_eq!(outcome, MergeOutcome::Missing);
    let tree = inspector.tree(TreeKind::Locals);
    assert!(!tree.find_node_by_expr("y").unwrap().is_loading());
    assert_eq!(rows(tree).len(), 2);
}

#[test]
fn test_inspector_remembers_expansion_per_function() {
    rdb_common::logging::ensure_test_logging(None);
    let mut inspector = NamespaceInspector::new();
    let requests = inspector.begin_refresh(Some(&main_frame()));
    inspector.apply(completion(&requests[0], Ok(locals_snapshot()))).unwrap();
    let expand = inspector.expand(TreeKind::Locals, "y").unwrap();
    inspector.apply(completion(&expand, Ok(vec![expanded_y()]))).unwrap();

    // Moving to another function starts from its root
    let helper = frame("/srv/app.py", 30, "helper");
    let requests = inspector.begin_refresh(Some(&helper));
    assert_eq!(requests[0].requests, vec![ExpressionRequest::expanded("locals()")]);
    let remembered = inspector.remembered_expansion(TreeKind::Locals, "main").unwrap();
    assert_eq!(remembered, [ExpressionRequest::expanded("locals()"), ExpressionRequest::expanded("y")]);

    // Globals belong to the same file, so they keep their expansion
    assert!(inspector.remembered_expansion(TreeKind::Globals, "/srv/app.py").is_none());

    // Coming back asks for the remembered expansion again
    let requests = inspector.begin_refresh(Some(&main_frame()));
    assert_eq!(requests[0].requests.len(), 2);
    assert_eq!(requests[0].requests[1], ExpressionRequest::expanded("y"));
}

#[test]
fn test_inspector_clear_all_keeps_memory() {
    rdb_common::logging::ensure_test_logging(None);
    let mut inspector = NamespaceInspector::new();
    let requests = inspector.begin_refresh(Some(&main_frame()));
    inspector.apply(completion(&requests[0], Ok(locals_snapshot()))).unwrap();

    assert!(inspector.begin_refresh(None).is_empty());

    for kind in TreeKind::ALL {
        assert!(inspector.tree(kind).is_empty());
    }
    let err = inspector.apply(completion(&requests[0], Ok(locals_snapshot()))).unwrap_err();
    assert!(matches!(err, DebugError::StaleResponse { .. }));
}

#[tokio::test]
async fn test_inspector_assign_checks_node() {
    rdb_common::logging::ensure_test_logging(None);
    let (mut coordinator, session, _observer, _launcher) = attached_coordinator().await;
    let mut inspector = NamespaceInspector::new();
    let requests = inspector.begin_refresh(Some(&main_frame()));
    let mut snapshot = locals_snapshot();
    snapshot[0].children.push(NamespaceNode {
        name: "__builtins__".to_string(),
        expr: "__builtins__".to_string(),
        type_name: "module".to_string(),
        is_valid: false,
        ..Default::default()
    });
    inspector.apply(completion(&requests[0], Ok(snapshot))).unwrap();

    inspector.assign(&mut coordinator, TreeKind::Locals, "x", "8").await.unwrap();
    assert!(session.calls().contains(&"execute x = 8".to_string()));

    let err = inspector
        .assign(&mut coordinator, TreeKind::Locals, "__builtins__", "None")
        .await
        .unwrap_err();
    assert!(matches!(err, DebugError::ReadOnly { .. }));

    let err = inspector.assign(&mut coordinator, TreeKind::Locals, "y[0]", "1").await.unwrap_err();
    assert!(matches!(err, DebugError::StaleResponse { .. }));
    assert_eq!(session.count("execute"), 1);
}
