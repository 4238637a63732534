//! The two-overmap scenario: keep 0.0.0 with span 180.

use crate::common::{forced, CopyHooks, TestWorld};
use mapprune::{
    Coordinate, DiffVerifier, MapDatabase, OvermapKey, PrunePlan, Pruner, RetentionSet, RunOutcome,
};

fn expect_pruned(outcome: RunOutcome) -> Box<mapprune::PruneReport> {
    match outcome {
        RunOutcome::Pruned(report) => report,
        other => panic!("expected a committed prune, got {:?}", other),
    }
}

#[test]
fn prune_keeps_owner_overmap_and_drops_the_rest() {
    let world = TestWorld::new();
    let report = expect_pruned(
        Pruner::new(&world.path, forced("0.0.0"))
            .run(&mut CopyHooks::accepting())
            .unwrap(),
    );

    assert_eq!(report.stats.submaps_deleted, 2);
    assert_eq!(report.stats.overmaps_deleted, 1);

    let db = world.open();
    let submaps: Vec<Coordinate> = db.submaps().unwrap().into_iter().map(|e| e.coord).collect();
    let overmaps: Vec<OvermapKey> = db.overmaps().unwrap().into_iter().map(|e| e.key).collect();
    assert_eq!(submaps, vec![Coordinate::new(0, 0, 0)]);
    assert_eq!(overmaps, vec![OvermapKey::new(0, 0)]);
    assert_eq!(report.remaining.total, 2);
}

#[test]
fn dry_run_matches_live_plan_and_leaves_file_identical() {
    let world = TestWorld::new();
    let before = world.bytes();

    let mut config = forced("0.0.0");
    config.dry_run = true;
    let RunOutcome::DryRun(dry) = Pruner::new(&world.path, config)
        .run(&mut CopyHooks::accepting())
        .unwrap()
    else {
        panic!("expected a dry run");
    };
    assert_eq!(world.bytes(), before);
    assert!(!world.backup_path().exists());

    let live = expect_pruned(
        Pruner::new(&world.path, forced("0.0.0"))
            .run(&mut CopyHooks::accepting())
            .unwrap(),
    );
    assert_eq!(dry.deleted_paths(), live.plan.deleted_paths());
    assert_eq!(dry.summary(), live.plan.summary());
    assert_eq!(dry.grid_actions, live.plan.grid_actions);
}

#[test]
fn verify_reports_matched_and_missing_from_result() {
    let world = TestWorld::new();
    let mut hooks = CopyHooks::accepting();
    Pruner::new(&world.path, forced("0.0.0")).run(&mut hooks).unwrap();

    let original = MapDatabase::open_read_only(&hooks.snapshots[0]).unwrap();
    let result = world.open();
    let report = DiffVerifier::new().verify(&original, &result).unwrap();

    assert_eq!(report.submaps.matched, vec![Coordinate::new(0, 0, 0)]);
    assert_eq!(
        report.submaps.missing_from_b,
        vec![Coordinate::new(0, 0, 1), Coordinate::new(200, 0, 0)]
    );
    assert!(report.submaps.missing_from_a.is_empty());
    assert!(report.submaps.content_mismatch.is_empty());
    // a plain diff treats the removals as a mismatch
    assert!(!report.is_consistent());

    let retention = RetentionSet::build(&[Coordinate::new(0, 0, 0)], 180).unwrap();
    let scoped = DiffVerifier::new().with_retention(retention).verify(&original, &result).unwrap();
    assert!(scoped.is_consistent());
}

#[test]
fn verify_against_after_prune_passes() {
    let world = TestWorld::new();
    std::fs::copy(&world.path, world.dir.path().join("original.sqlite3")).unwrap();

    let mut config = forced("0.0.0, 0.0.1");
    config.verify_against = Some(world.dir.path().join("original.sqlite3"));
    let report = expect_pruned(Pruner::new(&world.path, config).run(&mut CopyHooks::accepting()).unwrap());

    let verification = report.verification.as_ref().unwrap();
    assert!(verification.is_consistent());
    let edges = verification.edges.as_ref().unwrap();
    assert_eq!(edges.endpoints, 2);
    assert_eq!(edges.electric.in_a, 1);
    assert_eq!(edges.electric.in_b, 1);
}

#[test]
fn second_run_is_a_no_op() {
    let world = TestWorld::new();
    let mut hooks = CopyHooks::accepting();
    Pruner::new(&world.path, forced("0.0.0")).run(&mut hooks).unwrap();

    let db = world.open();
    let retention = RetentionSet::build(&[Coordinate::new(0, 0, 0)], 180).unwrap();
    let plan = PrunePlan::compute(&db, &retention, mapprune::GridMode::Preserve).unwrap();
    assert!(plan.is_noop());
    drop(db);

    let second = expect_pruned(Pruner::new(&world.path, forced("0.0.0")).run(&mut hooks).unwrap());
    assert_eq!(second.stats.submaps_deleted, 0);
    assert_eq!(second.stats.overmaps_deleted, 0);
    assert_eq!(second.stats.overmaps_rewritten, 0);

    // the snapshot taken before the second run is the first run's output
    let first_output = MapDatabase::open_read_only(&hooks.snapshots[1]).unwrap();
    let report = DiffVerifier::new().verify(&first_output, &world.open()).unwrap();
    assert!(report.submaps.is_identical());
    assert!(report.overmaps.is_identical());
    assert!(report.is_consistent());
}

#[test]
fn no_vacuum_skips_compaction() {
    let world = TestWorld::new();
    let mut config = forced("0.0.0");
    config.no_vacuum = true;
    let report = expect_pruned(Pruner::new(&world.path, config).run(&mut CopyHooks::accepting()).unwrap());
    assert!(!report.compaction.did_compact());
    assert_eq!(report.remaining.submaps, 1);
}

#[test]
fn span_changes_overmap_assignment() {
    let world = TestWorld::new();
    // with span 100, 200.0.0 belongs to o.2.0, which is not in the save
    let mut config = forced("200.0.0");
    config.span = 100;
    config.dry_run = true;
    let RunOutcome::DryRun(plan) = Pruner::new(&world.path, config)
        .run(&mut CopyHooks::accepting())
        .unwrap()
    else {
        panic!("expected a dry run");
    };
    assert_eq!(plan.missing_overmaps, vec![OvermapKey::new(2, 0)]);
    assert_eq!(plan.summary().overmaps_deleted, 2);
    assert_eq!(plan.summary().submaps_kept, 1);
}
