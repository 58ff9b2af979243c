use contestdesk_core::db::open_db_in_memory;
use contestdesk_core::{
    ConsistencyError, ListView, Problem, ProblemError, ProblemId, ProblemRepository,
    ProblemService, SqliteProblemRepository,
};

fn id(value: &str) -> ProblemId {
    ProblemId::parse(value).unwrap()
}

fn seed_scenario<R: ProblemRepository>(service: &ProblemService<R>) {
    for (raw, name) in [("p1", "Alpha"), ("p2", "Beta"), ("p3", "Gamma")] {
        service
            .create_problem(&Problem::with_id(id(raw), name, name))
            .unwrap();
    }
    service.reorder(2, 0).unwrap();
}

fn labels_and_names(view: &ListView) -> Vec<(String, String)> {
    view.entries()
        .unwrap()
        .into_iter()
        .map(|entry| (entry.label, entry.short_name))
        .collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(label, name)| (label.to_string(), name.to_string()))
        .collect()
}

#[test]
fn scenario_renders_gamma_alpha_beta_labeled_abc() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    seed_scenario(&service);

    let view = ListView::open(&service).unwrap();
    assert_eq!(
        labels_and_names(&view),
        pairs(&[("A", "Gamma"), ("B", "Alpha"), ("C", "Beta")])
    );
}

#[test]
fn scenario_delete_p1_updates_entries() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    seed_scenario(&service);
    let mut view = ListView::open(&service).unwrap();

    let removed = view.delete(&service, 1).unwrap();

    assert_eq!(removed, id("p1"));
    assert_eq!(
        labels_and_names(&view),
        pairs(&[("A", "Gamma"), ("B", "Beta")])
    );
    assert_eq!(
        service.order_index().unwrap().ids(),
        [id("p3"), id("p2")].as_slice()
    );
    assert!(service.get_problem(&id("p1")).unwrap().is_none());
}

#[test]
fn entries_stay_empty_until_problems_load() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    seed_scenario(&service);

    let mut view = ListView::attach(&service);
    view.load_order(&service).unwrap();
    assert!(view.entries().unwrap().is_empty());

    view.load_problems(&service).unwrap();
    assert_eq!(view.entries().unwrap().len(), 3);
}

#[test]
fn empty_problem_store_hides_order_entries() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    conn.execute(
        "UPDATE miscellaneous SET value = '[\"p1\",\"p2\"]' WHERE name = 'problemsOrder';",
        [],
    )
    .unwrap();

    let view = ListView::open(&service).unwrap();
    assert!(view.entries().unwrap().is_empty());
}

#[test]
fn dangling_entry_fails_projection() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    seed_scenario(&service);
    conn.execute(
        "UPDATE miscellaneous SET value = '[\"p3\",\"ghost\"]' WHERE name = 'problemsOrder';",
        [],
    )
    .unwrap();

    let view = ListView::open(&service).unwrap();
    assert_eq!(
        view.entries().unwrap_err(),
        ConsistencyError::DanglingEntry(id("ghost"))
    );
}

#[test]
fn sync_picks_up_changes_from_other_writers() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    let mut view = ListView::open(&service).unwrap();
    assert!(view.entries().unwrap().is_empty());

    seed_scenario(&service);
    assert!(view.entries().unwrap().is_empty());

    assert!(view.sync(&service).unwrap());
    assert_eq!(view.entries().unwrap().len(), 3);
    assert!(!view.sync(&service).unwrap());
}

#[test]
fn reorder_twice_with_inverse_moves_restores_order() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    seed_scenario(&service);
    let mut view = ListView::open(&service).unwrap();
    let before = labels_and_names(&view);

    view.reorder(&service, 0, 2).unwrap();
    assert_eq!(
        labels_and_names(&view),
        pairs(&[("A", "Alpha"), ("B", "Beta"), ("C", "Gamma")])
    );

    view.reorder(&service, 2, 0).unwrap();
    assert_eq!(labels_and_names(&view), before);
}

#[test]
fn long_names_are_shortened_with_full_title_kept() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    service
        .create_problem(&Problem::with_id(
            id("p1"),
            "Shortest Path Queries",
            "Shortest Path Queries",
        ))
        .unwrap();

    let view = ListView::open(&service).unwrap();
    let entries = view.entries().unwrap();
    assert_eq!(entries[0].short_name, "Shortest Path Q...");
    assert_eq!(entries[0].title, "Shortest Path Queries");
}

#[test]
fn storage_failures_become_notices() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    seed_scenario(&service);
    let mut view = ListView::open(&service).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_problem_delete BEFORE DELETE ON problems
         BEGIN
             SELECT RAISE(ABORT, 'delete blocked');
         END;",
    )
    .unwrap();

    let err = view.delete(&service, 0).unwrap_err();
    assert!(matches!(err, ProblemError::Storage(_)));
    assert_eq!(view.entries().unwrap().len(), 3);

    let notices = view.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].operation, "delete");
    assert!(notices[0].message.contains("delete blocked"));
    assert!(view.take_notices().is_empty());
}

#[test]
fn consistency_failures_are_not_notices() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    seed_scenario(&service);
    let mut view = ListView::open(&service).unwrap();

    let err = view.reorder(&service, 0, 3).unwrap_err();
    assert!(matches!(err, ProblemError::Consistency(_)));
    assert!(view.take_notices().is_empty());
}

#[test]
fn labels_ignore_ids_and_names() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    for raw in ["zeta", "C", "a"] {
        service
            .create_problem(&Problem::with_id(id(raw), raw, raw))
            .unwrap();
    }

    let view = ListView::open(&service).unwrap();
    let labels = view
        .entries()
        .unwrap()
        .into_iter()
        .map(|entry| entry.label)
        .collect::<Vec<_>>();
    assert_eq!(labels, ["A", "B", "C"]);
}

#[test]
fn delete_from_unsynced_view_refuses_moved_row() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    for (raw, name) in [("p1", "Alpha"), ("p2", "Beta"), ("p3", "Gamma")] {
        service
            .create_problem(&Problem::with_id(id(raw), name, name))
            .unwrap();
    }
    let mut view = ListView::open(&service).unwrap();
    assert_eq!(view.entries().unwrap()[0].id, id("p1"));

    service.reorder(2, 0).unwrap();
    assert!(view.is_stale());

    let err = view.delete(&service, 0).unwrap_err();
    assert!(matches!(
        err,
        ProblemError::Consistency(ConsistencyError::StaleEntry { position: 0, ref expected, .. })
            if *expected == id("p1")
    ));
    assert!(view.take_notices().is_empty());
    assert_eq!(service.list_problems().unwrap().len(), 3);
    assert_eq!(
        service.order_index().unwrap().ids(),
        [id("p3"), id("p1"), id("p2")].as_slice()
    );

    view.sync(&service).unwrap();
    assert!(!view.is_stale());
    assert_eq!(view.delete(&service, 0).unwrap(), id("p3"));
    assert!(service.get_problem(&id("p1")).unwrap().is_some());
}

#[test]
fn delete_past_shown_rows_is_out_of_range() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    seed_scenario(&service);
    let mut view = ListView::open(&service).unwrap();

    let err = view.delete(&service, 3).unwrap_err();
    assert!(matches!(
        err,
        ProblemError::Consistency(ConsistencyError::PositionOutOfRange { position: 3, len: 3 })
    ));
    assert_eq!(service.list_problems().unwrap().len(), 3);
}

#[test]
fn sync_retries_source_whose_reload_failed() {
    let conn = open_db_in_memory().unwrap();
    let service = ProblemService::new(SqliteProblemRepository::try_new(&conn).unwrap());
    let mut view = ListView::open(&service).unwrap();

    service
        .create_problem(&Problem::with_id(id("p1"), "Alpha", "Alpha"))
        .unwrap();
    conn.execute(
        "UPDATE miscellaneous SET value = 'not json' WHERE name = 'problemsOrder';",
        [],
    )
    .unwrap();

    let err = view.sync(&service).unwrap_err();
    assert!(err.is_storage());
    assert!(view.is_stale());
    let notices = view.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].operation, "load_order");

    conn.execute(
        "UPDATE miscellaneous SET value = '[\"p1\"]' WHERE name = 'problemsOrder';",
        [],
    )
    .unwrap();

    assert!(view.sync(&service).unwrap());
    assert!(!view.is_stale());
    let entries = view.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id("p1"));
    assert!(!view.sync(&service).unwrap());
}
